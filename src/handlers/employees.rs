// src/handlers/employees.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::CurrentSession,
    models::employees::{Employee, EmployeeRole},
    services::directory_service::EmployeePatch,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeePayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    #[schema(example = "Ivan Petrov")]
    pub full_name: String,

    #[validate(length(min = 5, message = "Telefone inválido"))]
    #[schema(example = "+7 900 123-45-67")]
    pub phone: String,

    pub role: EmployeeRole,

    #[schema(example = "Técnico sênior")]
    pub position: Option<String>,

    // Conta de acesso vinculada (opcional)
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeePayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    pub full_name: Option<String>,
    #[validate(length(min = 5, message = "Telefone inválido"))]
    pub phone: Option<String>,
    pub role: Option<EmployeeRole>,
    pub position: Option<String>,
    pub is_active: Option<bool>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEmployeesQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

// POST /api/employees
#[utoipa::path(
    post,
    path = "/api/employees",
    tag = "Employees",
    request_body = CreateEmployeePayload,
    responses(
        (status = 201, description = "Funcionário criado", body = Employee),
        (status = 403, description = "Somente gerência")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_employee(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<CreateEmployeePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    if !session.is_manager() {
        return Err(AppError::Forbidden(
            "Somente gerência pode cadastrar funcionários.".to_string(),
        ));
    }

    let employee = app_state
        .directory_service
        .create_employee(
            &app_state.db_pool,
            &payload.full_name,
            &payload.phone,
            payload.role,
            payload.position.as_deref(),
            payload.user_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(employee)))
}

// GET /api/employees
#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "Employees",
    responses(
        (status = 200, description = "Lista de funcionários", body = Vec<Employee>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Query(query): Query<ListEmployeesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let employees = app_state
        .directory_service
        .list_employees(&app_state.db_pool, query.include_inactive)
        .await?;

    Ok((StatusCode::OK, Json(employees)))
}

// GET /api/employees/{id}
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "ID do funcionário")),
    responses(
        (status = 200, description = "Funcionário", body = Employee),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_employee(
    State(app_state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let employee = app_state
        .directory_service
        .get_employee(&app_state.db_pool, id)
        .await?;

    Ok((StatusCode::OK, Json(employee)))
}

// PATCH /api/employees/{id}
#[utoipa::path(
    patch,
    path = "/api/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "ID do funcionário")),
    request_body = UpdateEmployeePayload,
    responses(
        (status = 200, description = "Funcionário atualizado", body = Employee),
        (status = 403, description = "Somente gerência")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_employee(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEmployeePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    if !session.is_manager() {
        return Err(AppError::Forbidden(
            "Somente gerência pode alterar funcionários.".to_string(),
        ));
    }

    let patch = EmployeePatch {
        full_name: payload.full_name,
        phone: payload.phone,
        role: payload.role,
        position: payload.position.map(Some),
        is_active: payload.is_active,
        user_id: payload.user_id.map(Some),
    };

    let employee = app_state
        .directory_service
        .update_employee(&app_state.db_pool, id, patch)
        .await?;

    Ok((StatusCode::OK, Json(employee)))
}
