// src/db/employee_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::employees::{Employee, EmployeeRole},
};

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        full_name: &str,
        phone: &str,
        role: EmployeeRole,
        position: Option<&str>,
        user_id: Option<Uuid>,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (full_name, phone, role, position, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(full_name)
        .bind(phone)
        .bind(role)
        .bind(position)
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(employee)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        include_inactive: bool,
    ) -> Result<Vec<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = if include_inactive {
            "SELECT * FROM employees ORDER BY full_name ASC"
        } else {
            "SELECT * FROM employees WHERE is_active = TRUE ORDER BY full_name ASC"
        };

        let employees = sqlx::query_as::<_, Employee>(sql)
            .fetch_all(executor)
            .await?;

        Ok(employees)
    }

    pub async fn get<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(employee)
    }

    // Resolve a ficha de funcionário de uma conta autenticada (se existir)
    pub async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    // O service busca a ficha atual, aplica o patch e grava o conjunto completo
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        full_name: &str,
        phone: &str,
        role: EmployeeRole,
        position: Option<&str>,
        is_active: bool,
        user_id: Option<Uuid>,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            UPDATE employees
            SET full_name = $2, phone = $3, role = $4, position = $5,
                is_active = $6, user_id = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(phone)
        .bind(role)
        .bind(position)
        .bind(is_active)
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(employee)
    }
}
