use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::requests::{LifecycleAction, RequestStatus};

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    // A conta autenticada não possui ficha de funcionário; exigida para
    // aceitar/trabalhar solicitações.
    #[error("Conta sem ficha de funcionário")]
    NoEmployeeRecord,

    // Precondição do ciclo de vida falhou (ex.: concluir algo que não está
    // em andamento). Devolvemos a ação e o estado atual para o cliente.
    #[error("Transição inválida: {action} a partir de {from}")]
    InvalidTransition {
        action: LifecycleAction,
        from: RequestStatus,
    },

    // Perdemos a corrida do accept: outro funcionário já reivindicou.
    #[error("Solicitação já aceita por outro funcionário")]
    AlreadyAccepted,

    // Checklist/itens só podem ser alterados com a solicitação em andamento.
    #[error("Solicitação não está em estado editável")]
    EditLocked,

    // Variante para erros de banco de dados (exemplo com sqlx)
    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::EmailAlreadyExists => {
                (StatusCode::CONFLICT, "Este e-mail já está em uso.".to_string())
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string())
            }
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Token de autenticação inválido ou ausente.".to_string())
            }
            AppError::UserNotFound => {
                (StatusCode::NOT_FOUND, "Usuário não encontrado.".to_string())
            }
            AppError::ResourceNotFound(what) => {
                (StatusCode::NOT_FOUND, format!("{} não encontrado(a).", what))
            }
            AppError::Forbidden(why) => (StatusCode::FORBIDDEN, why),
            AppError::NoEmployeeRecord => (
                StatusCode::FORBIDDEN,
                "Esta conta não está vinculada a nenhum funcionário.".to_string(),
            ),
            AppError::InvalidTransition { action, from } => (
                StatusCode::CONFLICT,
                format!("Não é possível executar '{}' a partir do estado '{}'.", action, from),
            ),
            AppError::AlreadyAccepted => (
                StatusCode::CONFLICT,
                "Esta solicitação já foi aceita por outro funcionário.".to_string(),
            ),
            AppError::EditLocked => (
                StatusCode::CONFLICT,
                "A solicitação não está em um estado que permita edição.".to_string(),
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` vai logar a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string())
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
