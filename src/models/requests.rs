// src/models/requests.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::catalog::ProductCategory;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "history_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    Accepted,
    Declined,
    Cancelled,
    Completed,
    ItemAdded,
    ItemRemoved,
    PhotoAdded,
    ChecklistAdded,
    ChecklistToggled,
    ChecklistRemoved,
    PriorityEscalated,
}

// As quatro transições do ciclo de vida. A tabela `allowed_from` é a única
// fonte de verdade sobre quais estados admitem cada ação; o UPDATE guardado
// no repositório repete a mesma condição para fechar a janela de corrida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Accept,
    Decline,
    Cancel,
    Complete,
}

impl LifecycleAction {
    pub fn allowed_from(&self) -> &'static [RequestStatus] {
        match self {
            LifecycleAction::Accept => &[RequestStatus::Pending],
            LifecycleAction::Decline => &[RequestStatus::InProgress],
            // Cancelamento vale para qualquer estado não-terminal
            LifecycleAction::Cancel => &[RequestStatus::Pending, RequestStatus::InProgress],
            LifecycleAction::Complete => &[RequestStatus::InProgress],
        }
    }

    pub fn permits(&self, from: RequestStatus) -> bool {
        self.allowed_from().contains(&from)
    }
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleAction::Accept => "accept",
            LifecycleAction::Decline => "decline",
            LifecycleAction::Cancel => "cancel",
            LifecycleAction::Complete => "complete",
        };
        f.write_str(s)
    }
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    #[schema(example = "Elena Smirnova")]
    pub customer_name: String,
    pub customer_phone: String,
    pub address: String,
    #[schema(example = "Interfone não abre a porta do bloco 3")]
    pub problem: String,
    // Comentário do despachante; as transições nunca escrevem aqui
    pub notes: Option<String>,
    pub status: RequestStatus,
    pub priority: RequestPriority,
    // Pré-atribuição do despachante (opcional)
    pub assigned_to: Option<Uuid>,
    // Funcionário que reivindicou a solicitação; non-null apenas com
    // status in_progress/completed
    pub accepted_by: Option<Uuid>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub decline_reason: Option<String>,
    pub cancel_reason: Option<String>,
    pub work_report: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestItem {
    pub id: Uuid,
    pub request_id: Uuid,
    pub product_id: Uuid,
    #[schema(example = "2.0")]
    pub quantity: Decimal,
    // Preço congelado no momento da inclusão
    #[schema(example = "1500.00")]
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

// Item com os dados do produto juntados, para telas de detalhe e relatórios
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestItemDetail {
    pub id: Uuid,
    pub request_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub unit: String,
    pub category: ProductCategory,
    pub quantity: Decimal,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: Uuid,
    pub request_id: Uuid,
    pub item_text: String,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestPhoto {
    pub id: Uuid,
    pub request_id: Uuid,
    pub url: String,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub request_id: Uuid,
    pub action: HistoryAction,
    pub description: String,
    pub actor_id: Option<Uuid>,
    pub actor_name: String,
    pub created_at: DateTime<Utc>,
}

// Detalhe completo de uma solicitação para a tela do painel
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetail {
    #[serde(flatten)]
    pub header: ServiceRequest,
    pub assigned_to_name: Option<String>,
    pub accepted_by_name: Option<String>,
    pub items: Vec<RequestItemDetail>,
    pub checklist: Vec<ChecklistItem>,
    pub photos: Vec<RequestPhoto>,
    pub history: Vec<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_only_from_pending() {
        assert!(LifecycleAction::Accept.permits(RequestStatus::Pending));
        assert!(!LifecycleAction::Accept.permits(RequestStatus::InProgress));
        assert!(!LifecycleAction::Accept.permits(RequestStatus::Completed));
        assert!(!LifecycleAction::Accept.permits(RequestStatus::Cancelled));
    }

    #[test]
    fn decline_and_complete_only_from_in_progress() {
        for action in [LifecycleAction::Decline, LifecycleAction::Complete] {
            assert!(action.permits(RequestStatus::InProgress));
            assert!(!action.permits(RequestStatus::Pending));
            assert!(!action.permits(RequestStatus::Completed));
            assert!(!action.permits(RequestStatus::Cancelled));
        }
    }

    #[test]
    fn cancel_from_any_non_terminal_state() {
        assert!(LifecycleAction::Cancel.permits(RequestStatus::Pending));
        assert!(LifecycleAction::Cancel.permits(RequestStatus::InProgress));
        assert!(!LifecycleAction::Cancel.permits(RequestStatus::Completed));
        assert!(!LifecycleAction::Cancel.permits(RequestStatus::Cancelled));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for action in [
            LifecycleAction::Accept,
            LifecycleAction::Decline,
            LifecycleAction::Cancel,
            LifecycleAction::Complete,
        ] {
            assert!(!action.permits(RequestStatus::Completed));
            assert!(!action.permits(RequestStatus::Cancelled));
        }
    }

    #[test]
    fn terminal_flags() {
        assert!(RequestStatus::Completed.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::InProgress.is_terminal());
    }
}
