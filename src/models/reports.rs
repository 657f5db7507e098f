// src/models/reports.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::catalog::ProductCategory;
use crate::models::requests::RequestStatus;

// --- Linhas cruas buscadas pelo report_repo (entrada da agregação) ---

// Uma solicitação do período, reduzida ao que os agregados precisam
#[derive(Debug, Clone, FromRow)]
pub struct ReportRequestRow {
    pub id: Uuid,
    pub status: RequestStatus,
    pub accepted_by: Option<Uuid>,
}

// Um item de solicitação CONCLUÍDA do período, com a categoria do produto
#[derive(Debug, Clone, FromRow)]
pub struct ReportItemRow {
    pub accepted_by: Option<Uuid>,
    pub quantity: Decimal,
    pub price: Decimal,
    pub category: ProductCategory,
}

// --- Resultados (saída da agregação) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotals {
    pub service_sum: Decimal,
    pub goods_sum: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStat {
    pub employee_id: Uuid,
    pub full_name: String,
    pub completed: i64,
    pub cancelled: i64,
    pub in_progress: i64,
    pub service_sum: Decimal,
    pub goods_sum: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
    // Período anterior vazio: variação indefinida, nunca divisão por zero
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTrend {
    pub direction: TrendDirection,
    #[schema(example = "25.0")]
    pub percent: Option<Decimal>,
}

// Resumo do período para o painel e para o export CSV
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub revenue: CategoryTotals,
    pub total_trend: PeriodTrend,
    pub completed_trend: PeriodTrend,
    pub employees: Vec<EmployeeStat>,
}
