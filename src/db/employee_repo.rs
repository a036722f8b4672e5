// src/db/employee_repo.rs

use sqlx::{types::Json, PgConnection};
use uuid::Uuid;

use crate::common::documents::only_digits;
use crate::common::error::{map_unique_violation, AppError};
use crate::db::listing::{filter, FilterKind, ListTable, within_export_limit, EXPORT_LIMIT};
use crate::db::record_ops;
use crate::models::employee::{Employee, EmployeePayload};
use crate::models::listing::{ListParams, SortDirection};
use crate::models::records::RecordStatus;

const TABLE: &str = "employees";
const NOT_FOUND: &str = "funcionário";

pub const LIST_TABLE: ListTable = ListTable {
    table: TABLE,
    filters: &[
        filter("name", "name", FilterKind::Contains),
        filter("cpf", "cpf", FilterKind::Contains),
        filter("position", "position", FilterKind::Contains),
        filter("department", "department", FilterKind::Contains),
        filter("status", "status", FilterKind::Exact),
        filter("hiredFrom", "hire_date", FilterKind::DateFrom),
        filter("hiredTo", "hire_date", FilterKind::DateTo),
    ],
    sorts: &[
        ("name", "name"),
        ("cpf", "cpf"),
        ("position", "position"),
        ("department", "department"),
        ("salary", "salary"),
        ("hireDate", "hire_date"),
        ("status", "status"),
        ("createdAt", "created_at"),
    ],
    search: &["name", "cpf", "email", "position"],
    default_sort: ("name", SortDirection::Asc),
};

#[derive(Clone, Copy, Default)]
pub struct EmployeeRepository;

impl EmployeeRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        params: &ListParams,
    ) -> Result<(Vec<Employee>, i64), AppError> {
        let rows = LIST_TABLE
            .select(tenant_id, params)?
            .build_query_as::<Employee>()
            .fetch_all(&mut *conn)
            .await?;
        let total = LIST_TABLE
            .count(tenant_id, params)?
            .build_query_scalar::<i64>()
            .fetch_one(&mut *conn)
            .await?;
        Ok((rows, total))
    }

    pub async fn export(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        params: &ListParams,
    ) -> Result<Vec<Employee>, AppError> {
        let rows = LIST_TABLE
            .export(tenant_id, params)?
            .build_query_as::<Employee>()
            .fetch_all(conn)
            .await?;
        within_export_limit(rows, EXPORT_LIMIT)
    }

    pub async fn get(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<Employee, AppError> {
        sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or(AppError::NotFound(NOT_FOUND))
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        payload: &EmployeePayload,
    ) -> Result<Employee, AppError> {
        let cpf = only_digits(&payload.cpf);
        sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (
                tenant_id, name, cpf, rg, birth_date, email, phone, position, department,
                salary, hire_date, termination_date, address
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(payload.name.trim())
        .bind(&cpf)
        .bind(&payload.rg)
        .bind(payload.birth_date)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(payload.position.trim())
        .bind(&payload.department)
        .bind(payload.salary)
        .bind(payload.hire_date)
        .bind(payload.termination_date)
        .bind(payload.address.as_ref().map(Json))
        .fetch_one(conn)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::DocumentAlreadyExists(cpf.clone())))
    }

    pub async fn update(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
        payload: &EmployeePayload,
    ) -> Result<Employee, AppError> {
        let cpf = only_digits(&payload.cpf);
        sqlx::query_as::<_, Employee>(
            r#"
            UPDATE employees SET
                name = $3, cpf = $4, rg = $5, birth_date = $6, email = $7, phone = $8,
                position = $9, department = $10, salary = $11, hire_date = $12,
                termination_date = $13, address = $14, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(payload.name.trim())
        .bind(&cpf)
        .bind(&payload.rg)
        .bind(payload.birth_date)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(payload.position.trim())
        .bind(&payload.department)
        .bind(payload.salary)
        .bind(payload.hire_date)
        .bind(payload.termination_date)
        .bind(payload.address.as_ref().map(Json))
        .fetch_optional(conn)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::DocumentAlreadyExists(cpf.clone())))?
        .ok_or(AppError::NotFound(NOT_FOUND))
    }

    pub async fn set_status(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
        status: RecordStatus,
    ) -> Result<(), AppError> {
        record_ops::set_status(conn, TABLE, NOT_FOUND, tenant_id, id, status).await
    }

    pub async fn bulk_set_status(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        ids: &[Uuid],
        status: RecordStatus,
    ) -> Result<u64, AppError> {
        record_ops::bulk_set_status(conn, TABLE, NOT_FOUND, tenant_id, ids, status).await
    }

    pub async fn delete(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        record_ops::delete(conn, TABLE, NOT_FOUND, tenant_id, id).await
    }
}
