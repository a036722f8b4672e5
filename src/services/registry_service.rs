// src/services/registry_service.rs
//
// Funcionários, transportadoras e produtos: validação pelo derive e CRUD no repositório.

use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{CarrierRepository, EmployeeRepository, ProductRepository},
    models::{
        carrier::{Carrier, CarrierPayload},
        employee::{Employee, EmployeePayload},
        listing::{ListParams, Page},
        product::{Product, ProductPayload},
        records::RecordStatus,
    },
};

// As três entidades têm a mesma superfície; a macro só evita repetir os repasses.
macro_rules! registry_service {
    ($service:ident, $repo:ident, $row:ty, $payload:ty, $label:literal) => {
        #[derive(Clone, Copy, Default)]
        pub struct $service {
            repo: $repo,
        }

        impl $service {
            pub fn new() -> Self {
                Self { repo: $repo::new() }
            }

            pub async fn list(
                &self,
                conn: &mut PgConnection,
                tenant_id: Uuid,
                params: &ListParams,
            ) -> Result<Page<$row>, AppError> {
                let (rows, total) = self.repo.list(conn, tenant_id, params).await?;
                Ok(Page::new(rows, params, total))
            }

            pub async fn export_rows(
                &self,
                conn: &mut PgConnection,
                tenant_id: Uuid,
                params: &ListParams,
            ) -> Result<Vec<$row>, AppError> {
                self.repo.export(conn, tenant_id, params).await
            }

            pub async fn get(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<$row, AppError> {
                self.repo.get(conn, tenant_id, id).await
            }

            pub async fn create(
                &self,
                conn: &mut PgConnection,
                tenant_id: Uuid,
                payload: &$payload,
            ) -> Result<$row, AppError> {
                payload.validate()?;
                let row = self.repo.create(conn, tenant_id, payload).await?;
                tracing::info!("📇 {} criado: {}", $label, row.id);
                Ok(row)
            }

            pub async fn update(
                &self,
                conn: &mut PgConnection,
                tenant_id: Uuid,
                id: Uuid,
                payload: &$payload,
            ) -> Result<$row, AppError> {
                payload.validate()?;
                self.repo.update(conn, tenant_id, id, payload).await
            }

            pub async fn set_status(
                &self,
                conn: &mut PgConnection,
                tenant_id: Uuid,
                id: Uuid,
                status: RecordStatus,
            ) -> Result<(), AppError> {
                self.repo.set_status(conn, tenant_id, id, status).await
            }

            pub async fn bulk_set_status(
                &self,
                conn: &mut PgConnection,
                tenant_id: Uuid,
                ids: &[Uuid],
                status: RecordStatus,
            ) -> Result<u64, AppError> {
                self.repo.bulk_set_status(conn, tenant_id, ids, status).await
            }

            pub async fn delete(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
                self.repo.delete(conn, tenant_id, id).await
            }
        }
    };
}

registry_service!(EmployeeService, EmployeeRepository, Employee, EmployeePayload, "funcionário");
registry_service!(CarrierService, CarrierRepository, Carrier, CarrierPayload, "transportadora");
registry_service!(ProductService, ProductRepository, Product, ProductPayload, "produto");
