// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::CurrentSession,
    models::reports::ReportSummary,
};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

fn validate_range(query: &ReportQuery) -> Result<(), AppError> {
    if query.from > query.to {
        let mut error = validator::ValidationError::new("invalid_range");
        error.message = Some("A data inicial deve ser anterior à final.".into());
        let mut errors = validator::ValidationErrors::new();
        errors.add("from".into(), error);
        return Err(AppError::ValidationError(errors));
    }
    Ok(())
}

// GET /api/reports/summary?from=2026-03-01&to=2026-03-31
#[utoipa::path(
    get,
    path = "/api/reports/summary",
    tag = "Reports",
    params(
        ("from" = NaiveDate, Query, description = "Início do período (inclusivo)"),
        ("to" = NaiveDate, Query, description = "Fim do período (inclusivo)")
    ),
    responses(
        (status = 200, description = "Resumo do período com tendência e quebra por funcionário", body = ReportSummary)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    validate_range(&query)?;

    let summary = app_state
        .report_service
        .summary(&app_state.db_pool, query.from, query.to)
        .await?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/reports/export?from=2026-03-01&to=2026-03-31
// CSV com BOM UTF-8, download direto — nada fica armazenado no servidor
#[utoipa::path(
    get,
    path = "/api/reports/export",
    tag = "Reports",
    params(
        ("from" = NaiveDate, Query, description = "Início do período (inclusivo)"),
        ("to" = NaiveDate, Query, description = "Fim do período (inclusivo)")
    ),
    responses(
        (status = 200, description = "Relatório em CSV", body = String, content_type = "text/csv")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_csv(
    State(app_state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    validate_range(&query)?;

    let summary = app_state
        .report_service
        .summary(&app_state.db_pool, query.from, query.to)
        .await?;

    let csv = app_state.report_service.export_csv(&summary);

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"relatorio-{}-{}.csv\"",
                query.from, query.to
            ),
        ),
    ];

    Ok((headers, csv))
}
