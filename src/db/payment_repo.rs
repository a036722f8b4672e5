// src/db/payment_repo.rs

use rust_decimal::Decimal;
use sqlx::{types::Json, PgConnection};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::listing::{filter, FilterKind, ListTable};
use crate::models::listing::{ListParams, SortDirection};
use crate::models::payment::{Payer, Payment, PaymentArtifacts, PaymentIntake, PaymentMethod, PaymentStatus};

pub const LIST_TABLE: ListTable = ListTable {
    table: "payments",
    filters: &[
        filter("method", "method", FilterKind::Exact),
        filter("status", "status", FilterKind::Exact),
        filter("description", "description", FilterKind::Contains),
        filter("createdFrom", "created_at", FilterKind::DateFrom),
        filter("createdTo", "created_at", FilterKind::DateTo),
    ],
    sorts: &[
        ("amount", "amount"),
        ("method", "method"),
        ("status", "status"),
        ("createdAt", "created_at"),
    ],
    search: &["description", "gateway_id"],
    default_sort: ("created_at", SortDirection::Desc),
};

/// Dados do pagamento a gravar na confirmação.
pub struct NewPayment<'a> {
    pub user_id: Uuid,
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub description: Option<&'a str>,
    pub status: PaymentStatus,
    pub gateway_id: Option<&'a str>,
    pub payer: &'a Payer,
    pub artifacts: Option<&'a PaymentArtifacts>,
}

#[derive(Clone, Copy, Default)]
pub struct PaymentRepository;

impl PaymentRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Rascunho do assistente (uma linha por tenant + usuário)
    // ---

    pub async fn load_draft(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PaymentIntake>, AppError> {
        let state = sqlx::query_scalar::<_, Json<PaymentIntake>>(
            "SELECT state FROM payment_drafts WHERE tenant_id = $1 AND user_id = $2",
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
        Ok(state.map(|s| s.0))
    }

    pub async fn save_draft(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user_id: Uuid,
        state: &PaymentIntake,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO payment_drafts (tenant_id, user_id, state)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, user_id)
            DO UPDATE SET state = EXCLUDED.state, updated_at = NOW()
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(Json(state))
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn delete_draft(&self, conn: &mut PgConnection, tenant_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM payment_drafts WHERE tenant_id = $1 AND user_id = $2")
            .bind(tenant_id)
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    // ---
    // Pagamentos confirmados
    // ---

    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        new: NewPayment<'_>,
    ) -> Result<Payment, AppError> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (
                tenant_id, user_id, method, amount, description, status, gateway_id, payer, artifacts
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(new.user_id)
        .bind(new.method)
        .bind(new.amount)
        .bind(new.description)
        .bind(new.status)
        .bind(new.gateway_id)
        .bind(Json(new.payer))
        .bind(new.artifacts.map(Json))
        .fetch_one(conn)
        .await?;
        Ok(payment)
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        params: &ListParams,
    ) -> Result<(Vec<Payment>, i64), AppError> {
        let rows = LIST_TABLE
            .select(tenant_id, params)?
            .build_query_as::<Payment>()
            .fetch_all(&mut *conn)
            .await?;
        let total = LIST_TABLE
            .count(tenant_id, params)?
            .build_query_scalar::<i64>()
            .fetch_one(&mut *conn)
            .await?;
        Ok((rows, total))
    }
}
