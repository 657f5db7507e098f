// src/db/request_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::requests::{
        ChecklistItem, HistoryAction, HistoryEntry, RequestItem, RequestItemDetail,
        RequestPhoto, RequestPriority, RequestStatus, ServiceRequest,
    },
};

#[derive(Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  SOLICITAÇÕES
    // =========================================================================

    pub async fn create<'e, E>(
        &self,
        executor: E,
        client_id: Option<Uuid>,
        customer_name: &str,
        customer_phone: &str,
        address: &str,
        problem: &str,
        notes: Option<&str>,
        priority: RequestPriority,
        assigned_to: Option<Uuid>,
    ) -> Result<ServiceRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ServiceRequest>(
            r#"
            INSERT INTO service_requests (
                client_id, customer_name, customer_phone, address,
                problem, notes, priority, assigned_to
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(customer_name)
        .bind(customer_phone)
        .bind(address)
        .bind(problem)
        .bind(notes)
        .bind(priority)
        .bind(assigned_to)
        .fetch_one(executor)
        .await?;

        Ok(request)
    }

    // Listagem pura: nenhum efeito colateral em leitura
    pub async fn list<'e, E>(
        &self,
        executor: E,
        status: Option<RequestStatus>,
        accepted_by: Option<Uuid>,
    ) -> Result<Vec<ServiceRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM service_requests WHERE 1 = 1");

        if let Some(status) = status {
            qb.push(" AND status = ");
            qb.push_bind(status);
        }
        if let Some(employee_id) = accepted_by {
            qb.push(" AND accepted_by = ");
            qb.push_bind(employee_id);
        }
        qb.push(" ORDER BY created_at DESC");

        let requests = qb
            .build_query_as::<ServiceRequest>()
            .fetch_all(executor)
            .await?;

        Ok(requests)
    }

    pub async fn get<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<ServiceRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request =
            sqlx::query_as::<_, ServiceRequest>("SELECT * FROM service_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(executor)
                .await?;

        Ok(request)
    }

    // Nomes dos funcionários atribuído/aceitante para a tela de detalhe
    pub async fn get_employee_names(
        &self,
        id: Uuid,
    ) -> Result<(Option<String>, Option<String>), AppError> {
        let names = sqlx::query_as::<_, (Option<String>, Option<String>)>(
            r#"
            SELECT a.full_name, b.full_name
            FROM service_requests r
            LEFT JOIN employees a ON r.assigned_to = a.id
            LEFT JOIN employees b ON r.accepted_by = b.id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(names.unwrap_or((None, None)))
    }

    // Edição do despachante (prioridade, observações, pré-atribuição)
    pub async fn update_dispatch_fields<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        priority: RequestPriority,
        notes: Option<&str>,
        assigned_to: Option<Uuid>,
        client_id: Option<Uuid>,
    ) -> Result<ServiceRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests
            SET priority = $2, notes = $3, assigned_to = $4, client_id = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(priority)
        .bind(notes)
        .bind(assigned_to)
        .bind(client_id)
        .fetch_one(executor)
        .await?;

        Ok(request)
    }

    // Válvula de escape do gerente; filhos caem em cascata
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM service_requests WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    //  TRANSIÇÕES GUARDADAS
    //  A cláusula WHERE repete a precondição da tabela de transições: se duas
    //  chamadas correrem, só a primeira encontra a linha. Zero linhas = perdeu.
    // =========================================================================

    pub async fn accept_guarded<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        employee_id: Uuid,
        accepted_at: DateTime<Utc>,
    ) -> Result<Option<ServiceRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests
            SET status = $3, accepted_by = $2, accepted_at = $4, updated_at = NOW()
            WHERE id = $1 AND status = $5
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(employee_id)
        .bind(RequestStatus::InProgress)
        .bind(accepted_at)
        .bind(RequestStatus::Pending)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    // Devolve a solicitação ao pool; limpa o par accepted_by/accepted_at
    pub async fn decline_guarded<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        reason: &str,
    ) -> Result<Option<ServiceRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests
            SET status = $3, accepted_by = NULL, accepted_at = NULL,
                decline_reason = $2, updated_at = NOW()
            WHERE id = $1 AND status = $4
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .bind(RequestStatus::Pending)
        .bind(RequestStatus::InProgress)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    pub async fn cancel_guarded<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        reason: &str,
    ) -> Result<Option<ServiceRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests
            SET status = $3, cancel_reason = $2, updated_at = NOW()
            WHERE id = $1 AND (status = $4 OR status = $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .bind(RequestStatus::Cancelled)
        .bind(RequestStatus::Pending)
        .bind(RequestStatus::InProgress)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    pub async fn complete_guarded<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        work_report: Option<&str>,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<ServiceRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests
            SET status = $3, completed_at = $4, work_report = $2, updated_at = NOW()
            WHERE id = $1 AND status = $5
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(work_report)
        .bind(RequestStatus::Completed)
        .bind(completed_at)
        .bind(RequestStatus::InProgress)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    // Escalonamento de prioridade em um único UPDATE; devolve os ids afetados
    // para que o service grave o histórico na mesma transação
    pub async fn escalate_stale<'e, E>(
        &self,
        executor: E,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE service_requests
            SET priority = $1, updated_at = NOW()
            WHERE (status = $2 OR status = $3)
              AND priority <> $1
              AND created_at <= $4
            RETURNING id
            "#,
        )
        .bind(RequestPriority::Urgent)
        .bind(RequestStatus::Pending)
        .bind(RequestStatus::InProgress)
        .bind(cutoff)
        .fetch_all(executor)
        .await?;

        Ok(ids)
    }

    // =========================================================================
    //  ITENS
    // =========================================================================

    pub async fn add_item<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<RequestItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, RequestItem>(
            r#"
            INSERT INTO request_items (request_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(product_id)
        .bind(quantity)
        .bind(price)
        .fetch_one(executor)
        .await?;

        Ok(item)
    }

    pub async fn get_item<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
    ) -> Result<Option<RequestItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, RequestItem>("SELECT * FROM request_items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(executor)
            .await?;

        Ok(item)
    }

    pub async fn remove_item<'e, E>(&self, executor: E, item_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM request_items WHERE id = $1")
            .bind(item_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn list_item_details<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
    ) -> Result<Vec<RequestItemDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, RequestItemDetail>(
            r#"
            SELECT
                i.id, i.request_id, i.product_id,
                p.name AS product_name, p.unit, p.category,
                i.quantity, i.price, i.created_at
            FROM request_items i
            JOIN products p ON i.product_id = p.id
            WHERE i.request_id = $1
            ORDER BY i.created_at ASC
            "#,
        )
        .bind(request_id)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }

    // =========================================================================
    //  CHECKLIST
    // =========================================================================

    pub async fn add_checklist_item<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        item_text: &str,
    ) -> Result<ChecklistItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // A subquery pega a próxima posição de exibição automaticamente
        let item = sqlx::query_as::<_, ChecklistItem>(
            r#"
            INSERT INTO request_checklist (request_id, item_text, order_index)
            VALUES (
                $1, $2,
                (
                    SELECT COALESCE(MAX(order_index) + 1, 0)
                    FROM request_checklist
                    WHERE request_id = $1
                )
            )
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(item_text)
        .fetch_one(executor)
        .await?;

        Ok(item)
    }

    pub async fn get_checklist_item<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
    ) -> Result<Option<ChecklistItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item =
            sqlx::query_as::<_, ChecklistItem>("SELECT * FROM request_checklist WHERE id = $1")
                .bind(item_id)
                .fetch_optional(executor)
                .await?;

        Ok(item)
    }

    pub async fn toggle_checklist_item<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<ChecklistItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // No UPDATE, o lado direito enxerga os valores antigos da linha
        let item = sqlx::query_as::<_, ChecklistItem>(
            r#"
            UPDATE request_checklist
            SET is_completed = NOT is_completed,
                completed_at = CASE WHEN is_completed THEN NULL ELSE $2 END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(now)
        .fetch_optional(executor)
        .await?;

        Ok(item)
    }

    pub async fn delete_checklist_item<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM request_checklist WHERE id = $1")
            .bind(item_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn list_checklist<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
    ) -> Result<Vec<ChecklistItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, ChecklistItem>(
            "SELECT * FROM request_checklist WHERE request_id = $1 ORDER BY order_index ASC",
        )
        .bind(request_id)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }

    // =========================================================================
    //  FOTOS
    // =========================================================================

    pub async fn add_photo<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        url: &str,
        uploaded_by: Option<Uuid>,
    ) -> Result<RequestPhoto, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let photo = sqlx::query_as::<_, RequestPhoto>(
            r#"
            INSERT INTO request_photos (request_id, url, uploaded_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(url)
        .bind(uploaded_by)
        .fetch_one(executor)
        .await?;

        Ok(photo)
    }

    pub async fn list_photos<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
    ) -> Result<Vec<RequestPhoto>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let photos = sqlx::query_as::<_, RequestPhoto>(
            "SELECT * FROM request_photos WHERE request_id = $1 ORDER BY created_at ASC",
        )
        .bind(request_id)
        .fetch_all(executor)
        .await?;

        Ok(photos)
    }

    // =========================================================================
    //  HISTÓRICO (append-only)
    // =========================================================================

    pub async fn add_history<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        action: HistoryAction,
        description: &str,
        actor_id: Option<Uuid>,
        actor_name: &str,
    ) -> Result<HistoryEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, HistoryEntry>(
            r#"
            INSERT INTO request_history (request_id, action, description, actor_id, actor_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(action)
        .bind(description)
        .bind(actor_id)
        .bind(actor_name)
        .fetch_one(executor)
        .await?;

        Ok(entry)
    }

    pub async fn list_history<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
    ) -> Result<Vec<HistoryEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, HistoryEntry>(
            "SELECT * FROM request_history WHERE request_id = $1 ORDER BY created_at ASC",
        )
        .bind(request_id)
        .fetch_all(executor)
        .await?;

        Ok(entries)
    }
}
