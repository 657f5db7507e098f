// src/models/employees.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Mapeia o CREATE TYPE employee_role do banco.
// A autorização (quem despacha, quem gerencia) deriva daqui; "position"
// é só texto de exibição.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "employee_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    Manager,
    Master,
    Dispatcher,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    // Conta de acesso vinculada (opcional; nem todo funcionário faz login)
    pub user_id: Option<Uuid>,
    #[schema(example = "Ivan Petrov")]
    pub full_name: String,
    #[schema(example = "+7 900 123-45-67")]
    pub phone: String,
    pub role: EmployeeRole,
    // Texto de exibição apenas (ex.: "Técnico sênior"); sem semântica
    pub position: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn is_manager(&self) -> bool {
        self.role == EmployeeRole::Manager
    }
}
