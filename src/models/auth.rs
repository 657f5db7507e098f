// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::employees::{Employee, EmployeeRole};

// Representa uma conta de acesso vinda do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "despacho@empresa.com")]
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    // Contas do escritório que operam sem ficha de funcionário
    pub is_admin: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para registro de uma nova conta
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "tecnico@empresa.com")]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID da conta)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

// Contexto de sessão montado uma única vez pelo middleware: a conta
// autenticada mais a sua ficha de funcionário (se houver). Os services
// recebem isto explicitamente em vez de consultar estado global.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub employee: Option<Employee>,
}

impl Session {
    pub fn is_manager(&self) -> bool {
        self.user.is_admin || self.employee.as_ref().is_some_and(|e| e.is_manager())
    }

    // Quem pode despachar: gerência ou despachante
    pub fn can_dispatch(&self) -> bool {
        self.is_manager()
            || self
                .employee
                .as_ref()
                .is_some_and(|e| e.role == EmployeeRole::Dispatcher)
    }

    pub fn employee_id(&self) -> Option<Uuid> {
        self.employee.as_ref().map(|e| e.id)
    }

    // ID gravado na trilha de auditoria: ficha de funcionário quando
    // existe, senão a própria conta
    pub fn actor_id(&self) -> Uuid {
        self.employee_id().unwrap_or(self.user.id)
    }

    pub fn actor_name(&self) -> &str {
        self.employee
            .as_ref()
            .map(|e| e.full_name.as_str())
            .unwrap_or(self.user.email.as_str())
    }
}
