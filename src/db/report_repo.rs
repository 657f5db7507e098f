// src/db/report_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::{
        reports::{ReportItemRow, ReportRequestRow},
        requests::RequestStatus,
    },
};

// Apenas busca linhas para a camada de agregação; nenhuma regra vive aqui.
#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Solicitações abertas dentro do período [from, to)
    pub async fn requests_in_range<'e, E>(
        &self,
        executor: E,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ReportRequestRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ReportRequestRow>(
            r#"
            SELECT id, status, accepted_by
            FROM service_requests
            WHERE created_at >= $1 AND created_at < $2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    // Itens das solicitações CONCLUÍDAS do período, com a categoria do produto.
    // A receita dos relatórios considera apenas trabalho concluído.
    pub async fn completed_items_in_range<'e, E>(
        &self,
        executor: E,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ReportItemRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ReportItemRow>(
            r#"
            SELECT r.accepted_by, i.quantity, i.price, p.category
            FROM request_items i
            JOIN service_requests r ON i.request_id = r.id
            JOIN products p ON i.product_id = p.id
            WHERE r.status = $1
              AND r.created_at >= $2 AND r.created_at < $3
            "#,
        )
        .bind(RequestStatus::Completed)
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    // Contagens (total, concluídas) de um período, para o cálculo de tendência
    pub async fn counts_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<(i64, i64), AppError> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = $1)
            FROM service_requests
            WHERE created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(RequestStatus::Completed)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }
}
