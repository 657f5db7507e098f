// src/handlers/requests.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::CurrentSession,
    models::requests::{
        ChecklistItem, RequestDetail, RequestItem, RequestPhoto, RequestPriority, RequestStatus,
        ServiceRequest,
    },
    services::request_service::{DispatchPatch, NewRequest},
};

fn default_priority() -> RequestPriority {
    RequestPriority::Medium
}

// Erro de validação construído à mão para checagens fora do derive
fn field_error(field: &'static str, message: &'static str) -> AppError {
    let mut error = validator::ValidationError::new("invalid");
    error.message = Some(message.into());
    let mut errors = validator::ValidationErrors::new();
    errors.add(field.into(), error);
    AppError::ValidationError(errors)
}

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestPayload {
    pub client_id: Option<Uuid>,

    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    #[schema(example = "Elena Smirnova")]
    pub customer_name: String,

    #[validate(length(min = 5, message = "Telefone inválido"))]
    pub customer_phone: String,

    #[validate(length(min = 5, message = "Endereço muito curto"))]
    pub address: String,

    #[validate(length(min = 5, message = "Descreva o problema"))]
    #[schema(example = "Interfone não abre a porta do bloco 3")]
    pub problem: String,

    pub notes: Option<String>,

    #[serde(default = "default_priority")]
    pub priority: RequestPriority,

    pub assigned_to: Option<Uuid>,
}

// Entrada do formulário público do site institucional
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicRequestPayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    pub customer_name: String,

    #[validate(length(min = 5, message = "Telefone inválido"))]
    pub customer_phone: String,

    #[validate(length(min = 5, message = "Endereço muito curto"))]
    pub address: String,

    #[validate(length(min = 5, message = "Descreva o problema"))]
    pub problem: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestPayload {
    pub priority: Option<RequestPriority>,
    pub notes: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReasonPayload {
    #[validate(length(min = 3, message = "Informe o motivo"))]
    #[schema(example = "Cliente remarcou a visita")]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletePayload {
    #[schema(example = "Painel substituído, fechadura ajustada")]
    pub work_report: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddItemPayload {
    pub product_id: Uuid,

    #[schema(example = "2.0")]
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddChecklistPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Testar abertura remota")]
    pub item_text: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPhotoPayload {
    // URL pública devolvida pelo armazenamento de arquivos do cliente
    #[validate(url(message = "URL inválida"))]
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequestsQuery {
    pub status: Option<RequestStatus>,
    pub accepted_by: Option<Uuid>,
}

// =============================================================================
//  CRUD
// =============================================================================

// POST /api/requests
#[utoipa::path(
    post,
    path = "/api/requests",
    tag = "Requests",
    request_body = CreateRequestPayload,
    responses(
        (status = 201, description = "Solicitação criada", body = ServiceRequest)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_request(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<CreateRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let request = app_state
        .request_service
        .create(
            &app_state.db_pool,
            NewRequest {
                client_id: payload.client_id,
                customer_name: payload.customer_name,
                customer_phone: payload.customer_phone,
                address: payload.address,
                problem: payload.problem,
                notes: payload.notes,
                priority: payload.priority,
                assigned_to: payload.assigned_to,
            },
            Some(&session),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

// POST /api/public/requests — formulário de contato do site, sem autenticação
#[utoipa::path(
    post,
    path = "/api/public/requests",
    tag = "Requests",
    request_body = PublicRequestPayload,
    responses(
        (status = 201, description = "Solicitação registrada", body = ServiceRequest)
    )
)]
pub async fn create_public_request(
    State(app_state): State<AppState>,
    Json(payload): Json<PublicRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let request = app_state
        .request_service
        .create(
            &app_state.db_pool,
            NewRequest {
                client_id: None,
                customer_name: payload.customer_name,
                customer_phone: payload.customer_phone,
                address: payload.address,
                problem: payload.problem,
                notes: None,
                priority: RequestPriority::Medium,
                assigned_to: None,
            },
            None,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

// GET /api/requests
#[utoipa::path(
    get,
    path = "/api/requests",
    tag = "Requests",
    params(
        ("status" = Option<RequestStatus>, Query, description = "Filtro por estado"),
        ("acceptedBy" = Option<Uuid>, Query, description = "Filtro por funcionário responsável")
    ),
    responses(
        (status = 200, description = "Lista de solicitações", body = Vec<ServiceRequest>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_requests(
    State(app_state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Query(query): Query<ListRequestsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let requests = app_state
        .request_service
        .list(&app_state.db_pool, query.status, query.accepted_by)
        .await?;

    Ok((StatusCode::OK, Json(requests)))
}

// GET /api/requests/{id}
#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    tag = "Requests",
    params(("id" = Uuid, Path, description = "ID da solicitação")),
    responses(
        (status = 200, description = "Detalhe completo", body = RequestDetail),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_request(
    State(app_state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state
        .request_service
        .get_detail(&app_state.db_pool, id)
        .await?;

    Ok((StatusCode::OK, Json(detail)))
}

// PATCH /api/requests/{id}
#[utoipa::path(
    patch,
    path = "/api/requests/{id}",
    tag = "Requests",
    params(("id" = Uuid, Path, description = "ID da solicitação")),
    request_body = UpdateRequestPayload,
    responses(
        (status = 200, description = "Solicitação atualizada", body = ServiceRequest),
        (status = 403, description = "Somente gerência ou despacho")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_request(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let patch = DispatchPatch {
        priority: payload.priority,
        notes: payload.notes.map(Some),
        assigned_to: payload.assigned_to.map(Some),
        client_id: payload.client_id.map(Some),
    };

    let request = app_state
        .request_service
        .update_dispatch(&app_state.db_pool, &session, id, patch)
        .await?;

    Ok((StatusCode::OK, Json(request)))
}

// DELETE /api/requests/{id}
#[utoipa::path(
    delete,
    path = "/api/requests/{id}",
    tag = "Requests",
    params(("id" = Uuid, Path, description = "ID da solicitação")),
    responses(
        (status = 204, description = "Removida"),
        (status = 403, description = "Somente gerência")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_request(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .request_service
        .delete(&app_state.db_pool, &session, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CICLO DE VIDA
// =============================================================================

// POST /api/requests/{id}/accept
#[utoipa::path(
    post,
    path = "/api/requests/{id}/accept",
    tag = "Lifecycle",
    params(("id" = Uuid, Path, description = "ID da solicitação")),
    responses(
        (status = 200, description = "Solicitação aceita", body = ServiceRequest),
        (status = 409, description = "Já aceita por outro funcionário ou transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn accept_request(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state
        .lifecycle_service
        .accept(&app_state.db_pool, &session, id)
        .await?;

    Ok((StatusCode::OK, Json(request)))
}

// POST /api/requests/{id}/decline
#[utoipa::path(
    post,
    path = "/api/requests/{id}/decline",
    tag = "Lifecycle",
    params(("id" = Uuid, Path, description = "ID da solicitação")),
    request_body = ReasonPayload,
    responses(
        (status = 200, description = "Devolvida ao pool", body = ServiceRequest),
        (status = 403, description = "Somente o responsável ou a gerência"),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn decline_request(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReasonPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let request = app_state
        .lifecycle_service
        .decline(&app_state.db_pool, &session, id, &payload.reason)
        .await?;

    Ok((StatusCode::OK, Json(request)))
}

// POST /api/requests/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/requests/{id}/cancel",
    tag = "Lifecycle",
    params(("id" = Uuid, Path, description = "ID da solicitação")),
    request_body = ReasonPayload,
    responses(
        (status = 200, description = "Cancelada", body = ServiceRequest),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_request(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReasonPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let request = app_state
        .lifecycle_service
        .cancel(&app_state.db_pool, &session, id, &payload.reason)
        .await?;

    Ok((StatusCode::OK, Json(request)))
}

// POST /api/requests/{id}/complete
#[utoipa::path(
    post,
    path = "/api/requests/{id}/complete",
    tag = "Lifecycle",
    params(("id" = Uuid, Path, description = "ID da solicitação")),
    request_body = CompletePayload,
    responses(
        (status = 200, description = "Serviço concluído", body = ServiceRequest),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_request(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompletePayload>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state
        .lifecycle_service
        .complete(
            &app_state.db_pool,
            &session,
            id,
            payload.work_report.as_deref(),
        )
        .await?;

    Ok((StatusCode::OK, Json(request)))
}

// =============================================================================
//  ITENS
// =============================================================================

// POST /api/requests/{id}/items
#[utoipa::path(
    post,
    path = "/api/requests/{id}/items",
    tag = "Requests",
    params(("id" = Uuid, Path, description = "ID da solicitação")),
    request_body = AddItemPayload,
    responses(
        (status = 201, description = "Item adicionado com preço congelado", body = RequestItem),
        (status = 409, description = "Solicitação em estado terminal")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_item(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    if payload.quantity <= Decimal::ZERO {
        return Err(field_error("quantity", "A quantidade deve ser positiva."));
    }

    let item = app_state
        .request_service
        .add_item(
            &app_state.db_pool,
            &session,
            id,
            payload.product_id,
            payload.quantity,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

// DELETE /api/requests/items/{item_id}
#[utoipa::path(
    delete,
    path = "/api/requests/items/{item_id}",
    tag = "Requests",
    params(("item_id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 204, description = "Item removido"),
        (status = 409, description = "Solicitação em estado terminal")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_item(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .request_service
        .remove_item(&app_state.db_pool, &session, item_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CHECKLIST
// =============================================================================

// POST /api/requests/{id}/checklist
#[utoipa::path(
    post,
    path = "/api/requests/{id}/checklist",
    tag = "Checklist",
    params(("id" = Uuid, Path, description = "ID da solicitação")),
    request_body = AddChecklistPayload,
    responses(
        (status = 201, description = "Item de checklist criado", body = ChecklistItem),
        (status = 409, description = "Solicitação não editável")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_checklist_item(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddChecklistPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let item = app_state
        .lifecycle_service
        .add_checklist_item(&app_state.db_pool, &session, id, &payload.item_text)
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

// PATCH /api/requests/checklist/{item_id}/toggle
#[utoipa::path(
    patch,
    path = "/api/requests/checklist/{item_id}/toggle",
    tag = "Checklist",
    params(("item_id" = Uuid, Path, description = "ID do item de checklist")),
    responses(
        (status = 200, description = "Item alternado", body = ChecklistItem)
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_checklist_item(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state
        .lifecycle_service
        .toggle_checklist_item(&app_state.db_pool, &session, item_id)
        .await?;

    Ok((StatusCode::OK, Json(item)))
}

// DELETE /api/requests/checklist/{item_id}
#[utoipa::path(
    delete,
    path = "/api/requests/checklist/{item_id}",
    tag = "Checklist",
    params(("item_id" = Uuid, Path, description = "ID do item de checklist")),
    responses(
        (status = 204, description = "Item removido")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_checklist_item(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .lifecycle_service
        .remove_checklist_item(&app_state.db_pool, &session, item_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  FOTOS
// =============================================================================

// POST /api/requests/{id}/photos
#[utoipa::path(
    post,
    path = "/api/requests/{id}/photos",
    tag = "Requests",
    params(("id" = Uuid, Path, description = "ID da solicitação")),
    request_body = AddPhotoPayload,
    responses(
        (status = 201, description = "Foto registrada", body = RequestPhoto)
    ),
    security(("api_jwt" = []))
)]
pub async fn add_photo(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddPhotoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let photo = app_state
        .request_service
        .add_photo(&app_state.db_pool, &session, id, &payload.url)
        .await?;

    Ok((StatusCode::CREATED, Json(photo)))
}

// =============================================================================
//  DOCUMENTO E MANUTENÇÃO
// =============================================================================

// GET /api/requests/{id}/act — ato de serviço concluído em PDF
#[utoipa::path(
    get,
    path = "/api/requests/{id}/act",
    tag = "Requests",
    params(("id" = Uuid, Path, description = "ID da solicitação")),
    responses(
        (status = 200, description = "PDF do ato de serviço", body = Vec<u8>, content_type = "application/pdf"),
        (status = 403, description = "Solicitação não concluída")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_completion_act(
    State(app_state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let pdf = app_state
        .document_service
        .generate_completion_act(&app_state.db_pool, id)
        .await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"ato-{}.pdf\"", id),
        ),
    ];

    Ok((headers, pdf))
}

// POST /api/requests/maintenance/escalate
// Rotina explícita de escalonamento; também roda pela task agendada no main
#[utoipa::path(
    post,
    path = "/api/requests/maintenance/escalate",
    tag = "Requests",
    responses(
        (status = 200, description = "Quantidade de solicitações escalonadas"),
        (status = 403, description = "Somente gerência")
    ),
    security(("api_jwt" = []))
)]
pub async fn escalate_stale_requests(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<impl IntoResponse, AppError> {
    if !session.is_manager() {
        return Err(AppError::Forbidden(
            "Somente gerência pode disparar o escalonamento.".to_string(),
        ));
    }

    let escalated = app_state
        .request_service
        .escalate_stale(&app_state.db_pool, Utc::now())
        .await?;

    Ok((StatusCode::OK, Json(json!({ "escalated": escalated }))))
}
