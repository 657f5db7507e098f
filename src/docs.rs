// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Employees ---
        handlers::employees::create_employee,
        handlers::employees::list_employees,
        handlers::employees::get_employee,
        handlers::employees::update_employee,

        // --- Clients ---
        handlers::clients::create_client,
        handlers::clients::list_clients,
        handlers::clients::update_client,

        // --- Catalog ---
        handlers::catalog::create_product,
        handlers::catalog::list_products,
        handlers::catalog::update_product,

        // --- Requests ---
        handlers::requests::create_request,
        handlers::requests::create_public_request,
        handlers::requests::list_requests,
        handlers::requests::get_request,
        handlers::requests::update_request,
        handlers::requests::delete_request,
        handlers::requests::accept_request,
        handlers::requests::decline_request,
        handlers::requests::cancel_request,
        handlers::requests::complete_request,
        handlers::requests::add_item,
        handlers::requests::remove_item,
        handlers::requests::add_checklist_item,
        handlers::requests::toggle_checklist_item,
        handlers::requests::remove_checklist_item,
        handlers::requests::add_photo,
        handlers::requests::get_completion_act,
        handlers::requests::escalate_stale_requests,

        // --- Reports ---
        handlers::reports::get_summary,
        handlers::reports::export_csv,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            handlers::auth::MeResponse,

            // --- Employees ---
            models::employees::EmployeeRole,
            models::employees::Employee,
            handlers::employees::CreateEmployeePayload,
            handlers::employees::UpdateEmployeePayload,

            // --- Clients ---
            models::clients::Client,
            handlers::clients::CreateClientPayload,
            handlers::clients::UpdateClientPayload,

            // --- Catalog ---
            models::catalog::ProductCategory,
            models::catalog::Product,
            handlers::catalog::CreateProductPayload,
            handlers::catalog::UpdateProductPayload,

            // --- Requests ---
            models::requests::RequestStatus,
            models::requests::RequestPriority,
            models::requests::HistoryAction,
            models::requests::LifecycleAction,
            models::requests::ServiceRequest,
            models::requests::RequestItem,
            models::requests::RequestItemDetail,
            models::requests::ChecklistItem,
            models::requests::RequestPhoto,
            models::requests::HistoryEntry,
            models::requests::RequestDetail,
            handlers::requests::CreateRequestPayload,
            handlers::requests::PublicRequestPayload,
            handlers::requests::UpdateRequestPayload,
            handlers::requests::ReasonPayload,
            handlers::requests::CompletePayload,
            handlers::requests::AddItemPayload,
            handlers::requests::AddChecklistPayload,
            handlers::requests::AddPhotoPayload,

            // --- Reports ---
            models::reports::CategoryTotals,
            models::reports::EmployeeStat,
            models::reports::TrendDirection,
            models::reports::PeriodTrend,
            models::reports::ReportSummary,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e sessão"),
        (name = "Employees", description = "Cadastro de funcionários de campo"),
        (name = "Clients", description = "Pontos de atendimento"),
        (name = "Catalog", description = "Catálogo de serviços e materiais"),
        (name = "Requests", description = "Solicitações de serviço"),
        (name = "Lifecycle", description = "Transições do ciclo de vida"),
        (name = "Checklist", description = "Checklist de execução"),
        (name = "Reports", description = "Relatórios e export")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
