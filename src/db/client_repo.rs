// src/db/client_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::clients::Client};

#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        address: &str,
        phone: Option<&str>,
        contact_person: Option<&str>,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, address, phone, contact_person)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(address)
        .bind(phone)
        .bind(contact_person)
        .fetch_one(executor)
        .await?;

        Ok(client)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        include_inactive: bool,
    ) -> Result<Vec<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = if include_inactive {
            "SELECT * FROM clients ORDER BY name ASC"
        } else {
            "SELECT * FROM clients WHERE is_active = TRUE ORDER BY name ASC"
        };

        let clients = sqlx::query_as::<_, Client>(sql).fetch_all(executor).await?;

        Ok(clients)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        address: &str,
        phone: Option<&str>,
        contact_person: Option<&str>,
        is_active: bool,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET name = $2, address = $3, phone = $4, contact_person = $5,
                is_active = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(address)
        .bind(phone)
        .bind(contact_person)
        .bind(is_active)
        .fetch_one(executor)
        .await?;

        Ok(client)
    }
}
