// src/services/catalog_service.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogRepository,
    models::catalog::{Product, ProductCategory},
};

#[derive(Clone)]
pub struct CatalogService {
    repo: CatalogRepository,
}

#[derive(Debug, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub unit: Option<String>,
    pub category: Option<ProductCategory>,
    pub is_active: Option<bool>,
}

impl CatalogService {
    pub fn new(repo: CatalogRepository) -> Self {
        Self { repo }
    }

    pub async fn create_product<'e, E>(
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
        self.repo
            .create(executor, name, price, unit, category)
            .await
    }

    pub async fn list_products(
        &self,
        category: Option<ProductCategory>,
    ) -> Result<Vec<Product>, AppError> {
        self.repo.list(category).await
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        patch: ProductPatch,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres> + Copy,
    {
        let current = self
            .repo
            .get(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".to_string()))?;

        let name = patch.name.unwrap_or(current.name);
        let price = patch.price.unwrap_or(current.price);
        let unit = patch.unit.unwrap_or(current.unit);
        let category = patch.category.unwrap_or(current.category);
        let is_active = patch.is_active.unwrap_or(current.is_active);

        self.repo
            .update(executor, id, &name, price, &unit, category, is_active)
            .await
    }
}
