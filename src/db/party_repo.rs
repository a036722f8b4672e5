// src/db/party_repo.rs
//
// Clientes e fornecedores compartilham o repositório; a tabela vem do PartyKind.

use sqlx::{types::Json, PgConnection};
use uuid::Uuid;

use crate::common::error::{map_unique_violation, AppError};
use crate::db::listing::{filter, FilterColumn, FilterKind, ListTable, within_export_limit, EXPORT_LIMIT};
use crate::db::record_ops;
use crate::models::listing::{ListParams, SortDirection};
use crate::models::party::{Party, PartyKind, PartyRecord};
use crate::models::records::RecordStatus;

const PARTY_FILTERS: &[FilterColumn] = &[
    filter("name", "name", FilterKind::Contains),
    filter("tradeName", "trade_name", FilterKind::Contains),
    filter("document", "document", FilterKind::Contains),
    filter("email", "email", FilterKind::Contains),
    filter("personType", "person_type", FilterKind::Exact),
    filter("status", "status", FilterKind::Exact),
    filter("createdFrom", "created_at", FilterKind::DateFrom),
    filter("createdTo", "created_at", FilterKind::DateTo),
];

const PARTY_SORTS: &[(&str, &str)] = &[
    ("name", "name"),
    ("tradeName", "trade_name"),
    ("document", "document"),
    ("personType", "person_type"),
    ("creditLimit", "credit_limit"),
    ("status", "status"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

const PARTY_SEARCH: &[&str] = &["name", "trade_name", "corporate_name", "document", "email"];

pub fn list_table(kind: PartyKind) -> ListTable {
    ListTable {
        table: kind.table(),
        filters: PARTY_FILTERS,
        sorts: PARTY_SORTS,
        search: PARTY_SEARCH,
        default_sort: ("name", SortDirection::Asc),
    }
}

#[derive(Clone, Copy)]
pub struct PartyRepository {
    kind: PartyKind,
}

impl PartyRepository {
    pub fn new(kind: PartyKind) -> Self {
        Self { kind }
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        params: &ListParams,
    ) -> Result<(Vec<Party>, i64), AppError> {
        let table = list_table(self.kind);
        let rows = table
            .select(tenant_id, params)?
            .build_query_as::<Party>()
            .fetch_all(&mut *conn)
            .await?;
        let total = table
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
    ) -> Result<Vec<Party>, AppError> {
        let rows = list_table(self.kind)
            .export(tenant_id, params)?
            .build_query_as::<Party>()
            .fetch_all(conn)
            .await?;
        within_export_limit(rows, EXPORT_LIMIT)
    }

    pub async fn get(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<Party, AppError> {
        sqlx::query_as::<_, Party>(&format!(
            "SELECT * FROM {} WHERE tenant_id = $1 AND id = $2",
            self.kind.table()
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::NotFound(self.kind.not_found()))
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        record: &PartyRecord,
    ) -> Result<Party, AppError> {
        let sql = format!(
            r#"
            INSERT INTO {} (
                tenant_id, person_type, document, name, trade_name, rg, birth_date,
                corporate_name, state_registration, country, email, phone,
                credit_limit, notes, addresses, contacts
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
            self.kind.table()
        );

        sqlx::query_as::<_, Party>(&sql)
            .bind(tenant_id)
            .bind(record.person_type)
            .bind(&record.document)
            .bind(&record.name)
            .bind(&record.trade_name)
            .bind(&record.rg)
            .bind(record.birth_date)
            .bind(&record.corporate_name)
            .bind(&record.state_registration)
            .bind(&record.country)
            .bind(&record.email)
            .bind(&record.phone)
            .bind(record.credit_limit)
            .bind(&record.notes)
            .bind(Json(&record.addresses))
            .bind(Json(&record.contacts))
            .fetch_one(conn)
            .await
            .map_err(|e| map_unique_violation(e, || AppError::DocumentAlreadyExists(record.document.clone())))
    }

    // Atualização completa (PUT); a situação só muda pelo PATCH
    pub async fn update(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
        record: &PartyRecord,
    ) -> Result<Party, AppError> {
        let sql = format!(
            r#"
            UPDATE {} SET
                person_type = $3, document = $4, name = $5, trade_name = $6, rg = $7,
                birth_date = $8, corporate_name = $9, state_registration = $10, country = $11,
                email = $12, phone = $13, credit_limit = $14, notes = $15,
                addresses = $16, contacts = $17, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
            self.kind.table()
        );

        sqlx::query_as::<_, Party>(&sql)
            .bind(tenant_id)
            .bind(id)
            .bind(record.person_type)
            .bind(&record.document)
            .bind(&record.name)
            .bind(&record.trade_name)
            .bind(&record.rg)
            .bind(record.birth_date)
            .bind(&record.corporate_name)
            .bind(&record.state_registration)
            .bind(&record.country)
            .bind(&record.email)
            .bind(&record.phone)
            .bind(record.credit_limit)
            .bind(&record.notes)
            .bind(Json(&record.addresses))
            .bind(Json(&record.contacts))
            .fetch_optional(conn)
            .await
            .map_err(|e| map_unique_violation(e, || AppError::DocumentAlreadyExists(record.document.clone())))?
            .ok_or(AppError::NotFound(self.kind.not_found()))
    }

    pub async fn set_status(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
        status: RecordStatus,
    ) -> Result<(), AppError> {
        record_ops::set_status(conn, self.kind.table(), self.kind.not_found(), tenant_id, id, status).await
    }

    pub async fn bulk_set_status(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        ids: &[Uuid],
        status: RecordStatus,
    ) -> Result<u64, AppError> {
        record_ops::bulk_set_status(conn, self.kind.table(), self.kind.not_found(), tenant_id, ids, status)
            .await
    }

    pub async fn delete(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        record_ops::delete(conn, self.kind.table(), self.kind.not_found(), tenant_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_table_follows_the_kind() {
        assert_eq!(list_table(PartyKind::Client).table, "clients");
        assert_eq!(list_table(PartyKind::Supplier).table, "suppliers");
    }

    #[test]
    fn person_type_filter_is_exact() {
        let params = ListParams {
            filters: [("personType".to_string(), "PJ".to_string())].into_iter().collect(),
            ..Default::default()
        };
        let qb = list_table(PartyKind::Supplier).count(Uuid::nil(), &params).unwrap();
        assert!(qb.sql().contains("lower(person_type::text) = lower($2)"));
    }
}
