// src/db/carrier_repo.rs

use sqlx::{types::Json, PgConnection};
use uuid::Uuid;

use crate::common::documents::{normalize_plate, only_digits};
use crate::common::error::{map_unique_violation, AppError};
use crate::db::listing::{filter, FilterKind, ListTable, within_export_limit, EXPORT_LIMIT};
use crate::db::record_ops;
use crate::models::carrier::{Carrier, CarrierPayload};
use crate::models::listing::{ListParams, SortDirection};
use crate::models::records::RecordStatus;

const TABLE: &str = "carriers";
const NOT_FOUND: &str = "transportadora";

pub const LIST_TABLE: ListTable = ListTable {
    table: TABLE,
    filters: &[
        filter("name", "name", FilterKind::Contains),
        filter("document", "document", FilterKind::Contains),
        filter("vehiclePlate", "vehicle_plate", FilterKind::Contains),
        filter("vehicleType", "vehicle_type", FilterKind::Exact),
        filter("status", "status", FilterKind::Exact),
    ],
    sorts: &[
        ("name", "name"),
        ("document", "document"),
        ("vehiclePlate", "vehicle_plate"),
        ("vehicleType", "vehicle_type"),
        ("status", "status"),
        ("createdAt", "created_at"),
    ],
    search: &["name", "document", "vehicle_plate", "rntrc"],
    default_sort: ("name", SortDirection::Asc),
};

#[derive(Clone, Copy, Default)]
pub struct CarrierRepository;

impl CarrierRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        params: &ListParams,
    ) -> Result<(Vec<Carrier>, i64), AppError> {
        let rows = LIST_TABLE
            .select(tenant_id, params)?
            .build_query_as::<Carrier>()
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
    ) -> Result<Vec<Carrier>, AppError> {
        let rows = LIST_TABLE
            .export(tenant_id, params)?
            .build_query_as::<Carrier>()
            .fetch_all(conn)
            .await?;
        within_export_limit(rows, EXPORT_LIMIT)
    }

    pub async fn get(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<Carrier, AppError> {
        sqlx::query_as::<_, Carrier>("SELECT * FROM carriers WHERE tenant_id = $1 AND id = $2")
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
        payload: &CarrierPayload,
    ) -> Result<Carrier, AppError> {
        let document = only_digits(&payload.document);
        sqlx::query_as::<_, Carrier>(
            r#"
            INSERT INTO carriers (
                tenant_id, name, document, state_registration, rntrc, vehicle_plate,
                vehicle_type, email, phone, address
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(payload.name.trim())
        .bind(&document)
        .bind(&payload.state_registration)
        .bind(&payload.rntrc)
        .bind(payload.vehicle_plate.as_deref().map(normalize_plate))
        .bind(&payload.vehicle_type)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(payload.address.as_ref().map(Json))
        .fetch_one(conn)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::DocumentAlreadyExists(document.clone())))
    }

    pub async fn update(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
        payload: &CarrierPayload,
    ) -> Result<Carrier, AppError> {
        let document = only_digits(&payload.document);
        sqlx::query_as::<_, Carrier>(
            r#"
            UPDATE carriers SET
                name = $3, document = $4, state_registration = $5, rntrc = $6,
                vehicle_plate = $7, vehicle_type = $8, email = $9, phone = $10,
                address = $11, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(payload.name.trim())
        .bind(&document)
        .bind(&payload.state_registration)
        .bind(&payload.rntrc)
        .bind(payload.vehicle_plate.as_deref().map(normalize_plate))
        .bind(&payload.vehicle_type)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(payload.address.as_ref().map(Json))
        .fetch_optional(conn)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::DocumentAlreadyExists(document.clone())))?
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
