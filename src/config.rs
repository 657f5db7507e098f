// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::db::{
    CatalogRepository, ClientRepository, EmployeeRepository, ReportRepository, RequestRepository,
    UserRepository,
};
use crate::services::{
    auth::AuthService, catalog_service::CatalogService, directory_service::DirectoryService,
    document_service::DocumentService, lifecycle_service::LifecycleService,
    report_service::ReportService, request_service::RequestService,
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub directory_service: DirectoryService,
    pub catalog_service: CatalogService,
    pub request_service: RequestService,
    pub lifecycle_service: LifecycleService,
    pub report_service: ReportService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let employee_repo = EmployeeRepository::new(db_pool.clone());
        let client_repo = ClientRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let request_repo = RequestRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo, employee_repo.clone(), jwt_secret);
        let directory_service = DirectoryService::new(employee_repo.clone(), client_repo);
        let catalog_service = CatalogService::new(catalog_repo.clone());
        let request_service = RequestService::new(request_repo.clone(), catalog_repo);
        let lifecycle_service = LifecycleService::new(request_repo.clone());
        let report_service = ReportService::new(report_repo, employee_repo);
        let document_service = DocumentService::new(request_repo);

        Ok(Self {
            db_pool,
            auth_service,
            directory_service,
            catalog_service,
            request_service,
            lifecycle_service,
            report_service,
            document_service,
        })
    }
}
