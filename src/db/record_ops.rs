// src/db/record_ops.rs
//
// Operações iguais em todos os cadastros: situação, situação em lote e exclusão.

use std::collections::BTreeSet;

use sqlx::PgConnection;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::records::RecordStatus;

pub async fn set_status(
    conn: &mut PgConnection,
    table: &'static str,
    not_found: &'static str,
    tenant_id: Uuid,
    id: Uuid,
    status: RecordStatus,
) -> Result<(), AppError> {
    let result = sqlx::query(&format!(
        "UPDATE {} SET status = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = $2",
        table
    ))
    .bind(tenant_id)
    .bind(id)
    .bind(status)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(not_found));
    }
    Ok(())
}

/// Tudo ou nada: se algum id não pertence ao tenant, nenhum é alterado
/// (o chamador descarta a transação).
pub async fn bulk_set_status(
    conn: &mut PgConnection,
    table: &'static str,
    not_found: &'static str,
    tenant_id: Uuid,
    ids: &[Uuid],
    status: RecordStatus,
) -> Result<u64, AppError> {
    let unique: Vec<Uuid> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

    let result = sqlx::query(&format!(
        "UPDATE {} SET status = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = ANY($2)",
        table
    ))
    .bind(tenant_id)
    .bind(&unique)
    .bind(status)
    .execute(conn)
    .await?;

    if result.rows_affected() != unique.len() as u64 {
        return Err(AppError::NotFound(not_found));
    }
    Ok(result.rows_affected())
}

pub async fn delete(
    conn: &mut PgConnection,
    table: &'static str,
    not_found: &'static str,
    tenant_id: Uuid,
    id: Uuid,
) -> Result<(), AppError> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE tenant_id = $1 AND id = $2", table))
        .bind(tenant_id)
        .bind(id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(not_found));
    }
    Ok(())
}
