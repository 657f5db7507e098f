// src/services/lifecycle_service.rs

use chrono::Utc;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RequestRepository,
    models::{
        auth::Session,
        requests::{ChecklistItem, HistoryAction, LifecycleAction, RequestStatus, ServiceRequest},
    },
};

// O motor do ciclo de vida. Cada transição roda em UMA transação:
// UPDATE guardado + campos estruturados + linha de histórico são atômicos —
// nunca fica uma solicitação aceita sem o registro de auditoria correspondente.
#[derive(Clone)]
pub struct LifecycleService {
    repo: RequestRepository,
}

// true quando a sessão é do funcionário que aceitou a solicitação
fn is_accepting_employee(request: &ServiceRequest, session: &Session) -> bool {
    matches!(
        (session.employee_id(), request.accepted_by),
        (Some(mine), Some(owner)) if mine == owner
    )
}

// Regra do checklist: apenas em andamento, e apenas pelo responsável ou gerência
pub fn ensure_can_edit(request: &ServiceRequest, session: &Session) -> Result<(), AppError> {
    if request.status != RequestStatus::InProgress {
        return Err(AppError::EditLocked);
    }
    if !session.is_manager() && !is_accepting_employee(request, session) {
        return Err(AppError::Forbidden(
            "Somente o funcionário responsável ou a gerência podem editar.".to_string(),
        ));
    }
    Ok(())
}

impl LifecycleService {
    pub fn new(repo: RequestRepository) -> Self {
        Self { repo }
    }

    // Traduz o "zero linhas" de um UPDATE guardado no erro certo,
    // consultando o estado que venceu a corrida.
    fn transition_error(
        &self,
        current: Option<ServiceRequest>,
        action: LifecycleAction,
    ) -> AppError {
        match current {
            None => AppError::ResourceNotFound("Solicitação".to_string()),
            Some(r) if action == LifecycleAction::Accept && r.status == RequestStatus::InProgress => {
                AppError::AlreadyAccepted
            }
            Some(r) => AppError::InvalidTransition {
                action,
                from: r.status,
            },
        }
    }

    fn ensure_owner_or_manager(
        &self,
        request: &ServiceRequest,
        session: &Session,
    ) -> Result<(), AppError> {
        if session.is_manager() || is_accepting_employee(request, session) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Somente o funcionário responsável ou a gerência podem executar esta ação."
                    .to_string(),
            ))
        }
    }

    // =========================================================================
    //  TRANSIÇÕES
    // =========================================================================

    // pending -> in_progress. O WHERE status = 'pending' do repositório decide
    // a corrida: de duas chamadas simultâneas, só uma encontra a linha; a
    // perdedora recebe AlreadyAccepted em vez de sobrescrever silenciosamente.
    pub async fn accept<'e, E>(
        &self,
        executor: E,
        session: &Session,
        request_id: Uuid,
    ) -> Result<ServiceRequest, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let employee = session.employee.as_ref().ok_or(AppError::NoEmployeeRecord)?;
        if !employee.is_active {
            return Err(AppError::Forbidden(
                "Funcionário inativo não pode aceitar solicitações.".to_string(),
            ));
        }

        let mut tx = executor.begin().await?;

        let updated = self
            .repo
            .accept_guarded(&mut *tx, request_id, employee.id, Utc::now())
            .await?;

        let Some(request) = updated else {
            // Perdemos a corrida (ou o estado não permitia). O retorno antecipado
            // derruba a transação; nada foi escrito.
            let current = self.repo.get(&mut *tx, request_id).await?;
            return Err(self.transition_error(current, LifecycleAction::Accept));
        };

        let mut description = format!("Aceita por {} ({})", employee.full_name, employee.phone);
        if let Some(assigned) = request.assigned_to {
            // Política registrada em DESIGN.md: reivindicar solicitação
            // pré-atribuída a outro funcionário é permitido, mas fica auditado
            if assigned != employee.id {
                description.push_str(" — estava pré-atribuída a outro funcionário");
            }
        }

        self.repo
            .add_history(
                &mut *tx,
                request_id,
                HistoryAction::Accepted,
                &description,
                Some(session.actor_id()),
                session.actor_name(),
            )
            .await?;

        tx.commit().await?;

        Ok(request)
    }

    // in_progress -> pending: devolve ao pool e limpa accepted_by/accepted_at
    pub async fn decline<'e, E>(
        &self,
        executor: E,
        session: &Session,
        request_id: Uuid,
        reason: &str,
    ) -> Result<ServiceRequest, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .get(&mut *tx, request_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Solicitação".to_string()))?;

        if current.status != RequestStatus::InProgress {
            return Err(AppError::InvalidTransition {
                action: LifecycleAction::Decline,
                from: current.status,
            });
        }
        self.ensure_owner_or_manager(&current, session)?;

        let updated = self.repo.decline_guarded(&mut *tx, request_id, reason).await?;
        let Some(request) = updated else {
            let current = self.repo.get(&mut *tx, request_id).await?;
            return Err(self.transition_error(current, LifecycleAction::Decline));
        };

        self.repo
            .add_history(
                &mut *tx,
                request_id,
                HistoryAction::Declined,
                &format!("Devolvida ao pool. Motivo: {}", reason),
                Some(session.actor_id()),
                session.actor_name(),
            )
            .await?;

        tx.commit().await?;

        Ok(request)
    }

    // Qualquer estado não-terminal -> cancelled. Terminal.
    pub async fn cancel<'e, E>(
        &self,
        executor: E,
        session: &Session,
        request_id: Uuid,
        reason: &str,
    ) -> Result<ServiceRequest, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .get(&mut *tx, request_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Solicitação".to_string()))?;

        if current.status.is_terminal() {
            return Err(AppError::InvalidTransition {
                action: LifecycleAction::Cancel,
                from: current.status,
            });
        }
        // Despacho/gerência cancelam sempre; o responsável, enquanto executa
        if !session.can_dispatch() && !is_accepting_employee(&current, session) {
            return Err(AppError::Forbidden(
                "Somente gerência, despacho ou o funcionário responsável podem cancelar."
                    .to_string(),
            ));
        }

        let updated = self.repo.cancel_guarded(&mut *tx, request_id, reason).await?;
        let Some(request) = updated else {
            let current = self.repo.get(&mut *tx, request_id).await?;
            return Err(self.transition_error(current, LifecycleAction::Cancel));
        };

        self.repo
            .add_history(
                &mut *tx,
                request_id,
                HistoryAction::Cancelled,
                &format!("Cancelada. Motivo: {}", reason),
                Some(session.actor_id()),
                session.actor_name(),
            )
            .await?;

        tx.commit().await?;

        Ok(request)
    }

    // in_progress -> completed. Terminal; completed_at >= accepted_at.
    pub async fn complete<'e, E>(
        &self,
        executor: E,
        session: &Session,
        request_id: Uuid,
        work_report: Option<&str>,
    ) -> Result<ServiceRequest, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .get(&mut *tx, request_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Solicitação".to_string()))?;

        if current.status != RequestStatus::InProgress {
            return Err(AppError::InvalidTransition {
                action: LifecycleAction::Complete,
                from: current.status,
            });
        }
        self.ensure_owner_or_manager(&current, session)?;

        let updated = self
            .repo
            .complete_guarded(&mut *tx, request_id, work_report, Utc::now())
            .await?;
        let Some(request) = updated else {
            let current = self.repo.get(&mut *tx, request_id).await?;
            return Err(self.transition_error(current, LifecycleAction::Complete));
        };

        self.repo
            .add_history(
                &mut *tx,
                request_id,
                HistoryAction::Completed,
                "Serviço concluído",
                Some(session.actor_id()),
                session.actor_name(),
            )
            .await?;

        tx.commit().await?;

        Ok(request)
    }

    // =========================================================================
    //  CHECKLIST
    //  As mutações entram no mesmo histórico das transições, em ordem
    //  cronológica.
    // =========================================================================

    pub async fn add_checklist_item<'e, E>(
        &self,
        executor: E,
        session: &Session,
        request_id: Uuid,
        item_text: &str,
    ) -> Result<ChecklistItem, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let request = self
            .repo
            .get(&mut *tx, request_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Solicitação".to_string()))?;
        ensure_can_edit(&request, session)?;

        let item = self
            .repo
            .add_checklist_item(&mut *tx, request_id, item_text)
            .await?;

        self.repo
            .add_history(
                &mut *tx,
                request_id,
                HistoryAction::ChecklistAdded,
                &format!("Checklist: \"{}\" adicionado", item_text),
                Some(session.actor_id()),
                session.actor_name(),
            )
            .await?;

        tx.commit().await?;

        Ok(item)
    }

    pub async fn toggle_checklist_item<'e, E>(
        &self,
        executor: E,
        session: &Session,
        item_id: Uuid,
    ) -> Result<ChecklistItem, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let item = self
            .repo
            .get_checklist_item(&mut *tx, item_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Item do checklist".to_string()))?;

        let request = self
            .repo
            .get(&mut *tx, item.request_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Solicitação".to_string()))?;
        ensure_can_edit(&request, session)?;

        let updated = self
            .repo
            .toggle_checklist_item(&mut *tx, item_id, Utc::now())
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Item do checklist".to_string()))?;

        let description = if updated.is_completed {
            format!("Checklist: \"{}\" concluído", updated.item_text)
        } else {
            format!("Checklist: \"{}\" reaberto", updated.item_text)
        };

        self.repo
            .add_history(
                &mut *tx,
                item.request_id,
                HistoryAction::ChecklistToggled,
                &description,
                Some(session.actor_id()),
                session.actor_name(),
            )
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    pub async fn remove_checklist_item<'e, E>(
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
            .get_checklist_item(&mut *tx, item_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Item do checklist".to_string()))?;

        let request = self
            .repo
            .get(&mut *tx, item.request_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Solicitação".to_string()))?;
        ensure_can_edit(&request, session)?;

        self.repo.delete_checklist_item(&mut *tx, item_id).await?;

        self.repo
            .add_history(
                &mut *tx,
                item.request_id,
                HistoryAction::ChecklistRemoved,
                &format!("Checklist: \"{}\" removido", item.item_text),
                Some(session.actor_id()),
                session.actor_name(),
            )
            .await?;

        tx.commit().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::User;
    use crate::models::employees::{Employee, EmployeeRole};
    use crate::models::requests::RequestPriority;
    use chrono::Utc;

    fn user(is_admin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "conta@empresa.com".to_string(),
            password_hash: "hash".to_string(),
            is_admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn employee(role: EmployeeRole) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            user_id: None,
            full_name: "Funcionário Teste".to_string(),
            phone: "+7 900 000-00-00".to_string(),
            role,
            position: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(status: RequestStatus, accepted_by: Option<Uuid>) -> ServiceRequest {
        ServiceRequest {
            id: Uuid::new_v4(),
            client_id: None,
            customer_name: "Cliente".to_string(),
            customer_phone: "+7 900 111-22-33".to_string(),
            address: "Rua Teste, 1".to_string(),
            problem: "Interfone mudo".to_string(),
            notes: None,
            status,
            priority: RequestPriority::Medium,
            assigned_to: None,
            accepted_by,
            accepted_at: accepted_by.map(|_| Utc::now()),
            completed_at: None,
            decline_reason: None,
            cancel_reason: None,
            work_report: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn accepting_employee_can_edit_while_in_progress() {
        let master = employee(EmployeeRole::Master);
        let session = Session {
            user: user(false),
            employee: Some(master.clone()),
        };
        let request = request(RequestStatus::InProgress, Some(master.id));

        assert!(ensure_can_edit(&request, &session).is_ok());
    }

    #[test]
    fn other_employee_cannot_edit() {
        let session = Session {
            user: user(false),
            employee: Some(employee(EmployeeRole::Master)),
        };
        let request = request(RequestStatus::InProgress, Some(Uuid::new_v4()));

        assert!(matches!(
            ensure_can_edit(&request, &session),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn manager_can_edit_any_in_progress_request() {
        let session = Session {
            user: user(false),
            employee: Some(employee(EmployeeRole::Manager)),
        };
        let request = request(RequestStatus::InProgress, Some(Uuid::new_v4()));

        assert!(ensure_can_edit(&request, &session).is_ok());
    }

    #[test]
    fn admin_account_without_employee_record_can_edit() {
        let session = Session {
            user: user(true),
            employee: None,
        };
        let request = request(RequestStatus::InProgress, Some(Uuid::new_v4()));

        assert!(ensure_can_edit(&request, &session).is_ok());
    }

    #[test]
    fn editing_is_locked_outside_in_progress() {
        let master = employee(EmployeeRole::Master);
        let session = Session {
            user: user(false),
            employee: Some(master.clone()),
        };

        for status in [
            RequestStatus::Pending,
            RequestStatus::Completed,
            RequestStatus::Cancelled,
        ] {
            let request = request(status, Some(master.id));
            assert!(matches!(
                ensure_can_edit(&request, &session),
                Err(AppError::EditLocked)
            ));
        }
    }

    #[test]
    fn session_without_employee_record_is_not_the_owner() {
        // accepted_by preenchido + sessão sem ficha: não pode casar como dono
        let session = Session {
            user: user(false),
            employee: None,
        };
        let request = request(RequestStatus::InProgress, Some(Uuid::new_v4()));

        assert!(!is_accepting_employee(&request, &session));
    }
}
