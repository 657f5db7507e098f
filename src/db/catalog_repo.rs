// src/db/catalog_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{Product, ProductCategory},
};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        price: Decimal,
        unit: &str,
        category: ProductCategory,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, price, unit, category)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(price)
        .bind(unit)
        .bind(category)
        .fetch_one(executor)
        .await?;

        Ok(product)
    }

    pub async fn list(&self, category: Option<ProductCategory>) -> Result<Vec<Product>, AppError> {
        let products = match category {
            Some(cat) => {
                sqlx::query_as::<_, Product>(
                    "SELECT * FROM products WHERE is_active = TRUE AND category = $1 ORDER BY name ASC",
                )
                .bind(cat)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>(
                    "SELECT * FROM products WHERE is_active = TRUE ORDER BY name ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(products)
    }

    pub async fn get<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(product)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        price: Decimal,
        unit: &str,
        category: ProductCategory,
        is_active: bool,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2, price = $3, unit = $4, category = $5,
                is_active = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(price)
        .bind(unit)
        .bind(category)
        .bind(is_active)
        .fetch_one(executor)
        .await?;

        Ok(product)
    }
}
