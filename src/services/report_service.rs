// src/services/report_service.rs

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{EmployeeRepository, ReportRepository},
    models::{
        catalog::ProductCategory,
        employees::Employee,
        reports::{
            CategoryTotals, EmployeeStat, PeriodTrend, ReportItemRow, ReportRequestRow,
            ReportSummary, TrendDirection,
        },
        requests::RequestStatus,
    },
};

// =============================================================================
//  FUNÇÕES PURAS DE AGREGAÇÃO
//  Operam sobre linhas já buscadas; nenhuma persistência aqui dentro.
// =============================================================================

// Divide a receita entre serviços e materiais pela categoria do produto
pub fn sum_by_category(items: &[ReportItemRow]) -> CategoryTotals {
    let mut service_sum = Decimal::ZERO;
    let mut goods_sum = Decimal::ZERO;

    for item in items {
        let line_total = item.price * item.quantity;
        match item.category {
            ProductCategory::Service => service_sum += line_total,
            ProductCategory::Goods => goods_sum += line_total,
        }
    }

    CategoryTotals {
        service_sum,
        goods_sum,
        total: service_sum + goods_sum,
    }
}

// Estatística por funcionário: contagens por estado e receita das
// solicitações concluídas, ordenada por receita total decrescente.
// Só entram funcionários com pelo menos uma solicitação no período.
pub fn employee_breakdown(
    requests: &[ReportRequestRow],
    items: &[ReportItemRow],
    employees: &[Employee],
) -> Vec<EmployeeStat> {
    let names: HashMap<Uuid, &str> = employees
        .iter()
        .map(|e| (e.id, e.full_name.as_str()))
        .collect();

    let mut stats: HashMap<Uuid, EmployeeStat> = HashMap::new();

    for request in requests {
        let Some(employee_id) = request.accepted_by else {
            continue; // ainda no pool, ninguém a contabilizar
        };
        let Some(name) = names.get(&employee_id) else {
            continue;
        };

        let stat = stats.entry(employee_id).or_insert_with(|| EmployeeStat {
            employee_id,
            full_name: name.to_string(),
            completed: 0,
            cancelled: 0,
            in_progress: 0,
            service_sum: Decimal::ZERO,
            goods_sum: Decimal::ZERO,
            total: Decimal::ZERO,
        });

        match request.status {
            RequestStatus::Completed => stat.completed += 1,
            RequestStatus::Cancelled => stat.cancelled += 1,
            RequestStatus::InProgress => stat.in_progress += 1,
            RequestStatus::Pending => {}
        }
    }

    // A receita vem apenas de solicitações concluídas: é tudo que o
    // report_repo entrega em `items`
    for item in items {
        let Some(employee_id) = item.accepted_by else {
            continue;
        };
        let Some(stat) = stats.get_mut(&employee_id) else {
            continue;
        };

        let line_total = item.price * item.quantity;
        match item.category {
            ProductCategory::Service => stat.service_sum += line_total,
            ProductCategory::Goods => stat.goods_sum += line_total,
        }
        stat.total += line_total;
    }

    let mut result: Vec<EmployeeStat> = stats.into_values().collect();
    result.sort_by(|a, b| b.total.cmp(&a.total));
    result
}

// Variação percentual entre o período atual e o anterior de mesmo tamanho.
// Período anterior vazio devolve o marcador neutro — nunca divide por zero.
pub fn period_trend(current: i64, previous: i64) -> PeriodTrend {
    if previous == 0 {
        return PeriodTrend {
            direction: TrendDirection::None,
            percent: None,
        };
    }

    let delta = Decimal::from(current) - Decimal::from(previous);
    let percent = (delta / Decimal::from(previous) * Decimal::ONE_HUNDRED).round_dp(1);

    let direction = match current.cmp(&previous) {
        std::cmp::Ordering::Greater => TrendDirection::Up,
        std::cmp::Ordering::Less => TrendDirection::Down,
        std::cmp::Ordering::Equal => TrendDirection::Flat,
    };

    PeriodTrend {
        direction,
        percent: Some(percent),
    }
}

fn percent_of(part: i64, total: i64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) / Decimal::from(total) * Decimal::ONE_HUNDRED).round_dp(1)
}

// Valores com vírgula/aspas/quebra de linha precisam ser citados
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// =============================================================================
//  SERVICE
// =============================================================================

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
    employee_repo: EmployeeRepository,
}

impl ReportService {
    pub fn new(repo: ReportRepository, employee_repo: EmployeeRepository) -> Self {
        Self {
            repo,
            employee_repo,
        }
    }

    pub async fn summary<'e, E>(
        &self,
        executor: E,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<ReportSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let from_ts = start_of_day(date_from);
        let to_ts = start_of_day(date_to + Duration::days(1)); // limite exclusivo

        // Transação para um snapshot consistente do período
        let mut tx = executor.begin().await?;
        let requests = self.repo.requests_in_range(&mut *tx, from_ts, to_ts).await?;
        let items = self
            .repo
            .completed_items_in_range(&mut *tx, from_ts, to_ts)
            .await?;
        let employees = self.employee_repo.list(&mut *tx, true).await?;
        tx.commit().await?;

        // Período anterior de mesmo tamanho, imediatamente antes
        let length = to_ts - from_ts;
        let (prev_total, prev_completed) =
            self.repo.counts_in_range(from_ts - length, from_ts).await?;

        let mut pending = 0;
        let mut in_progress = 0;
        let mut completed = 0;
        let mut cancelled = 0;
        for request in &requests {
            match request.status {
                RequestStatus::Pending => pending += 1,
                RequestStatus::InProgress => in_progress += 1,
                RequestStatus::Completed => completed += 1,
                RequestStatus::Cancelled => cancelled += 1,
            }
        }
        let total = requests.len() as i64;

        Ok(ReportSummary {
            date_from,
            date_to,
            total,
            pending,
            in_progress,
            completed,
            cancelled,
            revenue: sum_by_category(&items),
            total_trend: period_trend(total, prev_total),
            completed_trend: period_trend(completed, prev_completed),
            employees: employee_breakdown(&requests, &items, &employees),
        })
    }

    // Serializa o resumo como CSV com prefixo BOM UTF-8, para o Excel
    // abrir com a codificação certa. Download direto no cliente; nada
    // fica armazenado no servidor.
    pub fn export_csv(&self, summary: &ReportSummary) -> String {
        let mut out = String::from("\u{FEFF}");

        out.push_str(&format!(
            "Período,{},{}\n\n",
            summary.date_from, summary.date_to
        ));

        out.push_str("Indicador,Quantidade,Percentual\n");
        out.push_str(&format!("Total,{},100\n", summary.total));
        out.push_str(&format!(
            "Concluídas,{},{}\n",
            summary.completed,
            percent_of(summary.completed, summary.total)
        ));
        out.push_str(&format!(
            "Em andamento,{},{}\n",
            summary.in_progress,
            percent_of(summary.in_progress, summary.total)
        ));
        out.push_str(&format!(
            "Pendentes,{},{}\n",
            summary.pending,
            percent_of(summary.pending, summary.total)
        ));
        out.push_str(&format!(
            "Canceladas,{},{}\n\n",
            summary.cancelled,
            percent_of(summary.cancelled, summary.total)
        ));

        out.push_str(&format!("Receita serviços,{}\n", summary.revenue.service_sum));
        out.push_str(&format!("Receita materiais,{}\n", summary.revenue.goods_sum));
        out.push_str(&format!("Receita total,{}\n\n", summary.revenue.total));

        out.push_str("Funcionário,Concluídas,Canceladas,Em andamento,Serviços,Materiais,Total\n");
        for stat in &summary.employees {
            out.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                csv_escape(&stat.full_name),
                stat.completed,
                stat.cancelled,
                stat.in_progress,
                stat.service_sum,
                stat.goods_sum,
                stat.total
            ));
        }

        out
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .expect("meia-noite sempre existe")
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employees::EmployeeRole;
    use chrono::Utc;

    fn item(
        accepted_by: Option<Uuid>,
        price: i64,
        quantity: i64,
        category: ProductCategory,
    ) -> ReportItemRow {
        ReportItemRow {
            accepted_by,
            quantity: Decimal::from(quantity),
            price: Decimal::from(price),
            category,
        }
    }

    fn employee(name: &str) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            user_id: None,
            full_name: name.to_string(),
            phone: "+7 900 000-00-00".to_string(),
            role: EmployeeRole::Master,
            position: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn splits_revenue_between_service_and_goods() {
        let items = vec![
            item(None, 100, 2, ProductCategory::Goods),
            item(None, 50, 1, ProductCategory::Service),
        ];

        let totals = sum_by_category(&items);

        assert_eq!(totals.service_sum, Decimal::from(50));
        assert_eq!(totals.goods_sum, Decimal::from(200));
        assert_eq!(totals.total, Decimal::from(250));
    }

    #[test]
    fn empty_items_sum_to_zero() {
        let totals = sum_by_category(&[]);

        assert_eq!(totals.service_sum, Decimal::ZERO);
        assert_eq!(totals.goods_sum, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn trend_with_empty_previous_period_is_neutral() {
        let trend = period_trend(10, 0);

        assert_eq!(trend.direction, TrendDirection::None);
        assert_eq!(trend.percent, None);
    }

    #[test]
    fn trend_directions_and_percentages() {
        let up = period_trend(15, 10);
        assert_eq!(up.direction, TrendDirection::Up);
        assert_eq!(up.percent, Some(Decimal::from(50)));

        let down = period_trend(5, 10);
        assert_eq!(down.direction, TrendDirection::Down);
        assert_eq!(down.percent, Some(Decimal::from(-50)));

        let flat = period_trend(10, 10);
        assert_eq!(flat.direction, TrendDirection::Flat);
        assert_eq!(flat.percent, Some(Decimal::ZERO));
    }

    #[test]
    fn breakdown_counts_and_sorts_by_total_revenue() {
        let alexei = employee("Alexei");
        let marina = employee("Marina");
        let employees = vec![alexei.clone(), marina.clone()];

        let requests = vec![
            ReportRequestRow {
                id: Uuid::new_v4(),
                status: RequestStatus::Completed,
                accepted_by: Some(alexei.id),
            },
            ReportRequestRow {
                id: Uuid::new_v4(),
                status: RequestStatus::Completed,
                accepted_by: Some(marina.id),
            },
            ReportRequestRow {
                id: Uuid::new_v4(),
                status: RequestStatus::Cancelled,
                accepted_by: Some(marina.id),
            },
            // Pendente no pool: não conta para ninguém
            ReportRequestRow {
                id: Uuid::new_v4(),
                status: RequestStatus::Pending,
                accepted_by: None,
            },
        ];

        let items = vec![
            item(Some(alexei.id), 100, 1, ProductCategory::Service),
            item(Some(marina.id), 300, 1, ProductCategory::Goods),
        ];

        let stats = employee_breakdown(&requests, &items, &employees);

        assert_eq!(stats.len(), 2);
        // Marina lidera por receita
        assert_eq!(stats[0].full_name, "Marina");
        assert_eq!(stats[0].completed, 1);
        assert_eq!(stats[0].cancelled, 1);
        assert_eq!(stats[0].goods_sum, Decimal::from(300));
        assert_eq!(stats[1].full_name, "Alexei");
        assert_eq!(stats[1].service_sum, Decimal::from(100));
        assert_eq!(stats[1].total, Decimal::from(100));
    }

    #[tokio::test]
    async fn csv_starts_with_utf8_bom() {
        let service = ReportService {
            repo: panic_free_repo(),
            employee_repo: panic_free_employee_repo(),
        };
        let summary = empty_summary();

        let csv = service.export_csv(&summary);

        assert!(csv.starts_with('\u{FEFF}'));
        assert!(csv.contains("Indicador,Quantidade,Percentual"));
    }

    #[test]
    fn csv_quotes_names_containing_commas() {
        assert_eq!(csv_escape("Ivanov, Ivan"), "\"Ivanov, Ivan\"");
        assert_eq!(csv_escape("Simples"), "Simples");
        assert_eq!(csv_escape("A\"B"), "\"A\"\"B\"");
    }

    // Repositórios nunca tocados pelos testes de serialização
    fn panic_free_repo() -> ReportRepository {
        ReportRepository::new(sqlx::PgPool::connect_lazy("postgres://localhost/unused").unwrap())
    }

    fn panic_free_employee_repo() -> EmployeeRepository {
        EmployeeRepository::new(sqlx::PgPool::connect_lazy("postgres://localhost/unused").unwrap())
    }

    fn empty_summary() -> ReportSummary {
        ReportSummary {
            date_from: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            date_to: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            total: 0,
            pending: 0,
            in_progress: 0,
            completed: 0,
            cancelled: 0,
            revenue: sum_by_category(&[]),
            total_trend: period_trend(0, 0),
            completed_trend: period_trend(0, 0),
            employees: vec![],
        }
    }
}
