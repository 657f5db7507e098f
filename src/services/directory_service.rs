// src/services/directory_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ClientRepository, EmployeeRepository},
    models::{
        clients::Client,
        employees::{Employee, EmployeeRole},
    },
};

// Cadastros de pessoas: funcionários de campo e pontos de atendimento.
#[derive(Clone)]
pub struct DirectoryService {
    employee_repo: EmployeeRepository,
    client_repo: ClientRepository,
}

// Patch parcial vindo dos handlers; campos ausentes mantêm o valor atual
#[derive(Debug, Default)]
pub struct EmployeePatch {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<EmployeeRole>,
    pub position: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub user_id: Option<Option<Uuid>>,
}

#[derive(Debug, Default)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<Option<String>>,
    pub contact_person: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl DirectoryService {
    pub fn new(employee_repo: EmployeeRepository, client_repo: ClientRepository) -> Self {
        Self {
            employee_repo,
            client_repo,
        }
    }

    // --- FUNCIONÁRIOS ---

    pub async fn create_employee<'e, E>(
        &self,
        executor: E,
        full_name: &str,
        phone: &str,
        role: EmployeeRole,
        position: Option<&str>,
        user_id: Option<Uuid>,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.employee_repo
            .create(executor, full_name, phone, role, position, user_id)
            .await
    }

    pub async fn list_employees<'e, E>(
        &self,
        executor: E,
        include_inactive: bool,
    ) -> Result<Vec<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.employee_repo.list(executor, include_inactive).await
    }

    pub async fn get_employee<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.employee_repo
            .get(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Funcionário".to_string()))
    }

    pub async fn update_employee<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        patch: EmployeePatch,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres> + Copy,
    {
        let current = self
            .employee_repo
            .get(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Funcionário".to_string()))?;

        let full_name = patch.full_name.unwrap_or(current.full_name);
        let phone = patch.phone.unwrap_or(current.phone);
        let role = patch.role.unwrap_or(current.role);
        let position = patch.position.unwrap_or(current.position);
        let is_active = patch.is_active.unwrap_or(current.is_active);
        let user_id = patch.user_id.unwrap_or(current.user_id);

        self.employee_repo
            .update(
                executor,
                id,
                &full_name,
                &phone,
                role,
                position.as_deref(),
                is_active,
                user_id,
            )
            .await
    }

    // --- CLIENTES (pontos de atendimento) ---

    pub async fn create_client<'e, E>(
        &self,
        executor: E,
        name: &str,
        address: &str,
        phone: Option<&str>,
        contact_person: Option<&str>,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.client_repo
            .create(executor, name, address, phone, contact_person)
            .await
    }

    pub async fn list_clients<'e, E>(
        &self,
        executor: E,
        include_inactive: bool,
    ) -> Result<Vec<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.client_repo.list(executor, include_inactive).await
    }

    pub async fn update_client<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        patch: ClientPatch,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let current = self
            .client_repo
            .get(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cliente".to_string()))?;

        let name = patch.name.unwrap_or(current.name);
        let address = patch.address.unwrap_or(current.address);
        let phone = patch.phone.unwrap_or(current.phone);
        let contact_person = patch.contact_person.unwrap_or(current.contact_person);
        let is_active = patch.is_active.unwrap_or(current.is_active);

        self.client_repo
            .update(
                executor,
                id,
                &name,
                &address,
                phone.as_deref(),
                contact_person.as_deref(),
                is_active,
            )
            .await
    }
}
