//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Task periódica de escalonamento: a mesma rotina exposta no endpoint de
    // gerência, agendada fora do caminho de leitura
    {
        let state = app_state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                if let Err(e) = state
                    .request_service
                    .escalate_stale(&state.db_pool, chrono::Utc::now())
                    .await
                {
                    tracing::error!("Falha no escalonamento periódico: {}", e);
                }
            }
        });
    }

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let employee_routes = Router::new()
        .route(
            "/",
            post(handlers::employees::create_employee).get(handlers::employees::list_employees),
        )
        .route(
            "/{id}",
            get(handlers::employees::get_employee).patch(handlers::employees::update_employee),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let client_routes = Router::new()
        .route(
            "/",
            post(handlers::clients::create_client).get(handlers::clients::list_clients),
        )
        .route("/{id}", patch(handlers::clients::update_client))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let catalog_routes = Router::new()
        .route(
            "/products",
            post(handlers::catalog::create_product).get(handlers::catalog::list_products),
        )
        .route("/products/{id}", patch(handlers::catalog::update_product))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let request_routes = Router::new()
        .route(
            "/",
            post(handlers::requests::create_request).get(handlers::requests::list_requests),
        )
        .route(
            "/{id}",
            get(handlers::requests::get_request)
                .patch(handlers::requests::update_request)
                .delete(handlers::requests::delete_request),
        )
        // Transições do ciclo de vida
        .route("/{id}/accept", post(handlers::requests::accept_request))
        .route("/{id}/decline", post(handlers::requests::decline_request))
        .route("/{id}/cancel", post(handlers::requests::cancel_request))
        .route("/{id}/complete", post(handlers::requests::complete_request))
        // Itens, checklist e fotos
        .route("/{id}/items", post(handlers::requests::add_item))
        .route("/items/{item_id}", delete(handlers::requests::remove_item))
        .route(
            "/{id}/checklist",
            post(handlers::requests::add_checklist_item),
        )
        .route(
            "/checklist/{item_id}/toggle",
            patch(handlers::requests::toggle_checklist_item),
        )
        .route(
            "/checklist/{item_id}",
            delete(handlers::requests::remove_checklist_item),
        )
        .route("/{id}/photos", post(handlers::requests::add_photo))
        // Documento e manutenção
        .route("/{id}/act", get(handlers::requests::get_completion_act))
        .route(
            "/maintenance/escalate",
            post(handlers::requests::escalate_stale_requests),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let report_routes = Router::new()
        .route("/summary", get(handlers::reports::get_summary))
        .route("/export", get(handlers::reports::export_csv))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        // Formulário de contato do site institucional (sem autenticação)
        .route(
            "/api/public/requests",
            post(handlers::requests::create_public_request),
        )
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/employees", employee_routes)
        .nest("/api/clients", client_routes)
        .nest("/api/catalog", catalog_routes)
        .nest("/api/requests", request_routes)
        .nest("/api/reports", report_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
