// src/services/request_service.rs

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, RequestRepository},
    models::{
        auth::Session,
        requests::{
            HistoryAction, RequestDetail, RequestItem, RequestPhoto, RequestPriority,
            RequestStatus, ServiceRequest,
        },
    },
};

// Idade a partir da qual uma solicitação aberta vira urgente
const ESCALATION_AGE_DAYS: i64 = 2;

// Nome gravado no histórico para escritas sem ator humano
const SYSTEM_ACTOR: &str = "Sistema";
const PUBLIC_FORM_ACTOR: &str = "Formulário do site";

pub fn escalation_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(ESCALATION_AGE_DAYS)
}

#[derive(Debug)]
pub struct NewRequest {
    pub client_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: String,
    pub address: String,
    pub problem: String,
    pub notes: Option<String>,
    pub priority: RequestPriority,
    pub assigned_to: Option<Uuid>,
}

// Patch do despachante; `Some(None)` limpa o campo
#[derive(Debug, Default)]
pub struct DispatchPatch {
    pub priority: Option<RequestPriority>,
    pub notes: Option<Option<String>>,
    pub assigned_to: Option<Option<Uuid>>,
    pub client_id: Option<Option<Uuid>>,
}

#[derive(Clone)]
pub struct RequestService {
    repo: RequestRepository,
    catalog_repo: CatalogRepository,
}

impl RequestService {
    pub fn new(repo: RequestRepository, catalog_repo: CatalogRepository) -> Self {
        Self { repo, catalog_repo }
    }

    // Criação via painel (com sessão) ou via formulário público do site.
    // A linha de histórico "created" nasce na mesma transação.
    pub async fn create<'e, E>(
        &self,
        executor: E,
        new_request: NewRequest,
        session: Option<&Session>,
    ) -> Result<ServiceRequest, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let request = self
            .repo
            .create(
                &mut *tx,
                new_request.client_id,
                &new_request.customer_name,
                &new_request.customer_phone,
                &new_request.address,
                &new_request.problem,
                new_request.notes.as_deref(),
                new_request.priority,
                new_request.assigned_to,
            )
            .await?;

        let (actor_id, actor_name, description) = match session {
            Some(s) => (
                Some(s.actor_id()),
                s.actor_name().to_string(),
                "Solicitação criada".to_string(),
            ),
            None => (
                None,
                PUBLIC_FORM_ACTOR.to_string(),
                "Solicitação criada pelo formulário do site".to_string(),
            ),
        };

        self.repo
            .add_history(
                &mut *tx,
                request.id,
                HistoryAction::Created,
                &description,
                actor_id,
                &actor_name,
            )
            .await?;

        tx.commit().await?;

        Ok(request)
    }

    // Listagem sem efeitos colaterais; o escalonamento é uma rotina à parte
    pub async fn list<'e, E>(
        &self,
        executor: E,
        status: Option<RequestStatus>,
        accepted_by: Option<Uuid>,
    ) -> Result<Vec<ServiceRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list(executor, status, accepted_by).await
    }

    pub async fn get_detail<'e, E>(&self, executor: E, id: Uuid) -> Result<RequestDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // Transação para um snapshot consistente das coleções
        let mut tx = executor.begin().await?;

        let header = self
            .repo
            .get(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Solicitação".to_string()))?;

        let items = self.repo.list_item_details(&mut *tx, id).await?;
        let checklist = self.repo.list_checklist(&mut *tx, id).await?;
        let photos = self.repo.list_photos(&mut *tx, id).await?;
        let history = self.repo.list_history(&mut *tx, id).await?;

        tx.commit().await?;

        let (assigned_to_name, accepted_by_name) = self.repo.get_employee_names(id).await?;

        Ok(RequestDetail {
            header,
            assigned_to_name,
            accepted_by_name,
            items,
            checklist,
            photos,
            history,
        })
    }

    pub async fn update_dispatch<'e, E>(
        &self,
        executor: E,
        session: &Session,
        id: Uuid,
        patch: DispatchPatch,
    ) -> Result<ServiceRequest, AppError>
    where
        E: Executor<'e, Database = Postgres> + Copy,
    {
        if !session.can_dispatch() {
            return Err(AppError::Forbidden(
                "Somente gerência ou despacho podem editar a solicitação.".to_string(),
            ));
        }

        let current = self
            .repo
            .get(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Solicitação".to_string()))?;

        let priority = patch.priority.unwrap_or(current.priority);
        let notes = patch.notes.unwrap_or(current.notes);
        let assigned_to = patch.assigned_to.unwrap_or(current.assigned_to);
        let client_id = patch.client_id.unwrap_or(current.client_id);

        self.repo
            .update_dispatch_fields(
                executor,
                id,
                priority,
                notes.as_deref(),
                assigned_to,
                client_id,
            )
            .await
    }

    // Válvula de escape: apenas gerência remove solicitações
    pub async fn delete<'e, E>(
        &self,
        executor: E,
        session: &Session,
        id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !session.is_manager() {
            return Err(AppError::Forbidden(
                "Somente gerência pode remover solicitações.".to_string(),
            ));
        }

        let deleted = self.repo.delete(executor, id).await?;
        if deleted == 0 {
            return Err(AppError::ResourceNotFound("Solicitação".to_string()));
        }

        tracing::info!("Solicitação {} removida por {}", id, session.actor_name());
        Ok(())
    }

    // =========================================================================
    //  ITENS (preço congelado no momento da inclusão)
    // =========================================================================

    pub async fn add_item<'e, E>(
        &self,
        executor: E,
        session: &Session,
        request_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
    ) -> Result<RequestItem, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let request = self
            .repo
            .get(&mut *tx, request_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Solicitação".to_string()))?;

        if request.status.is_terminal() {
            return Err(AppError::EditLocked);
        }

        let product = self
            .catalog_repo
            .get(&mut *tx, product_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".to_string()))?;

        // O preço do catálogo é copiado agora; mudanças futuras não retroagem
        let item = self
            .repo
            .add_item(&mut *tx, request_id, product_id, quantity, product.price)
            .await?;

        self.repo
            .add_history(
                &mut *tx,
                request_id,
                HistoryAction::ItemAdded,
                &format!("Item adicionado: {} x {}", product.name, quantity),
                Some(session.actor_id()),
                session.actor_name(),
            )
            .await?;

        tx.commit().await?;

        Ok(item)
    }

    pub async fn remove_item<'e, E>(
        &self,
        executor: E,
        session: &Session,
        item_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let item = self
            .repo
            .get_item(&mut *tx, item_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Item".to_string()))?;

        let request = self
            .repo
            .get(&mut *tx, item.request_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Solicitação".to_string()))?;

        if request.status.is_terminal() {
            return Err(AppError::EditLocked);
        }

        let product_name = self
            .catalog_repo
            .get(&mut *tx, item.product_id)
            .await?
            .map(|p| p.name)
            .unwrap_or_else(|| item.product_id.to_string());

        self.repo.remove_item(&mut *tx, item_id).await?;

        self.repo
            .add_history(
                &mut *tx,
                item.request_id,
                HistoryAction::ItemRemoved,
                &format!("Item removido: {}", product_name),
                Some(session.actor_id()),
                session.actor_name(),
            )
            .await?;

        tx.commit().await?;

        Ok(())
    }

    // =========================================================================
    //  FOTOS
    // =========================================================================

    pub async fn add_photo<'e, E>(
        &self,
        executor: E,
        session: &Session,
        request_id: Uuid,
        url: &str,
    ) -> Result<RequestPhoto, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.repo
            .get(&mut *tx, request_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Solicitação".to_string()))?;

        let photo = self
            .repo
            .add_photo(&mut *tx, request_id, url, session.employee_id())
            .await?;

        self.repo
            .add_history(
                &mut *tx,
                request_id,
                HistoryAction::PhotoAdded,
                "Foto anexada",
                Some(session.actor_id()),
                session.actor_name(),
            )
            .await?;

        tx.commit().await?;

        Ok(photo)
    }

    // =========================================================================
    //  MANUTENÇÃO
    // =========================================================================

    // Rotina explícita de escalonamento: solicitações abertas há mais de
    // ESCALATION_AGE_DAYS dias viram urgentes. Chamada pelo endpoint de
    // gerência e pela task agendada no main — nunca por leituras.
    pub async fn escalate_stale<'e, E>(
        &self,
        executor: E,
        now: DateTime<Utc>,
    ) -> Result<usize, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let ids = self
            .repo
            .escalate_stale(&mut *tx, escalation_cutoff(now))
            .await?;

        for id in &ids {
            self.repo
                .add_history(
                    &mut *tx,
                    *id,
                    HistoryAction::PriorityEscalated,
                    &format!(
                        "Prioridade elevada para urgente ({} dias sem conclusão)",
                        ESCALATION_AGE_DAYS
                    ),
                    None,
                    SYSTEM_ACTOR,
                )
                .await?;
        }

        tx.commit().await?;

        if !ids.is_empty() {
            tracing::info!("{} solicitação(ões) escalonada(s) para urgente", ids.len());
        }

        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn three_day_old_request_is_past_the_cutoff() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let created_at = now - Duration::days(3);

        assert!(created_at <= escalation_cutoff(now));
    }

    #[test]
    fn one_day_old_request_is_not_past_the_cutoff() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let created_at = now - Duration::days(1);

        assert!(created_at > escalation_cutoff(now));
    }

    #[test]
    fn cutoff_is_exactly_two_days() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();

        assert_eq!(now - escalation_cutoff(now), Duration::days(2));
    }
}
