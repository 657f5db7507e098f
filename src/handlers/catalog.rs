// src/handlers/catalog.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::CurrentSession,
    models::catalog::{Product, ProductCategory},
    services::catalog_service::ProductPatch,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    #[schema(example = "Troca de painel de interfone")]
    pub name: String,

    #[schema(example = "1500.00")]
    pub price: Decimal,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "un")]
    pub unit: String,

    pub category: ProductCategory,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub unit: Option<String>,
    pub category: Option<ProductCategory>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub category: Option<ProductCategory>,
}

// POST /api/catalog/products
#[utoipa::path(
    post,
    path = "/api/catalog/products",
    tag = "Catalog",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 403, description = "Somente gerência")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    if !session.is_manager() {
        return Err(AppError::Forbidden(
            "Somente gerência pode alterar o catálogo.".to_string(),
        ));
    }

    let product = app_state
        .catalog_service
        .create_product(
            &app_state.db_pool,
            &payload.name,
            payload.price,
            &payload.unit,
            payload.category,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

// GET /api/catalog/products
#[utoipa::path(
    get,
    path = "/api/catalog/products",
    tag = "Catalog",
    responses(
        (status = 200, description = "Catálogo de produtos e serviços", body = Vec<Product>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Query(query): Query<ListProductsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state.catalog_service.list_products(query.category).await?;

    Ok((StatusCode::OK, Json(products)))
}

// PATCH /api/catalog/products/{id}
#[utoipa::path(
    patch,
    path = "/api/catalog/products/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 403, description = "Somente gerência")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    if !session.is_manager() {
        return Err(AppError::Forbidden(
            "Somente gerência pode alterar o catálogo.".to_string(),
        ));
    }

    let patch = ProductPatch {
        name: payload.name,
        price: payload.price,
        unit: payload.unit,
        category: payload.category,
        is_active: payload.is_active,
    };

    let product = app_state
        .catalog_service
        .update_product(&app_state.db_pool, id, patch)
        .await?;

    Ok((StatusCode::OK, Json(product)))
}
