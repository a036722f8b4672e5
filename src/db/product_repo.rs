// src/db/product_repo.rs

use sqlx::PgConnection;
use uuid::Uuid;

use crate::common::documents::only_digits;
use crate::common::error::{map_unique_violation, AppError};
use crate::db::listing::{filter, FilterKind, ListTable, within_export_limit, EXPORT_LIMIT};
use crate::db::record_ops;
use crate::models::listing::{ListParams, SortDirection};
use crate::models::product::{Product, ProductPayload};
use crate::models::records::RecordStatus;

const TABLE: &str = "products";
const NOT_FOUND: &str = "produto";

pub const LIST_TABLE: ListTable = ListTable {
    table: TABLE,
    filters: &[
        filter("name", "name", FilterKind::Contains),
        filter("sku", "sku", FilterKind::Contains),
        filter("barcode", "barcode", FilterKind::Exact),
        filter("brand", "brand", FilterKind::Contains),
        filter("category", "category", FilterKind::Contains),
        filter("ncm", "ncm", FilterKind::Exact),
        filter("status", "status", FilterKind::Exact),
    ],
    sorts: &[
        ("name", "name"),
        ("sku", "sku"),
        ("brand", "brand"),
        ("category", "category"),
        ("costPrice", "cost_price"),
        ("salePrice", "sale_price"),
        ("stockQuantity", "stock_quantity"),
        ("status", "status"),
        ("createdAt", "created_at"),
    ],
    search: &["name", "sku", "barcode", "brand"],
    default_sort: ("name", SortDirection::Asc),
};

fn clean_code(value: &Option<String>) -> Option<String> {
    value.as_deref().map(only_digits).filter(|v| !v.is_empty())
}

#[derive(Clone, Copy, Default)]
pub struct ProductRepository;

impl ProductRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        params: &ListParams,
    ) -> Result<(Vec<Product>, i64), AppError> {
        let mut select = LIST_TABLE.select(tenant_id, params)?;
        let rows = select.build_query_as::<Product>().fetch_all(&mut *conn).await?;
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
    ) -> Result<Vec<Product>, AppError> {
        let rows = LIST_TABLE
            .export(tenant_id, params)?
            .build_query_as::<Product>()
            .fetch_all(conn)
            .await?;
        within_export_limit(rows, EXPORT_LIMIT)
    }

    pub async fn get(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE tenant_id = $1 AND id = $2")
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
        payload: &ProductPayload,
    ) -> Result<Product, AppError> {
        let sku = payload.sku.trim().to_uppercase();
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                tenant_id, sku, barcode, name, description, unit, brand, category,
                cost_price, margin, sale_price, stock_quantity, min_stock, max_stock,
                ncm, cest, cfop, origin
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&sku)
        .bind(clean_code(&payload.barcode))
        .bind(payload.name.trim())
        .bind(&payload.description)
        .bind(payload.unit.trim().to_uppercase())
        .bind(&payload.brand)
        .bind(&payload.category)
        .bind(payload.cost_price)
        .bind(payload.margin)
        .bind(payload.effective_sale_price())
        .bind(payload.stock_quantity)
        .bind(payload.min_stock)
        .bind(payload.max_stock)
        .bind(clean_code(&payload.ncm))
        .bind(clean_code(&payload.cest))
        .bind(clean_code(&payload.cfop))
        .bind(payload.origin)
        .fetch_one(conn)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::SkuAlreadyExists(sku.clone())))
    }

    pub async fn update(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
        payload: &ProductPayload,
    ) -> Result<Product, AppError> {
        let sku = payload.sku.trim().to_uppercase();
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                sku = $3, barcode = $4, name = $5, description = $6, unit = $7, brand = $8,
                category = $9, cost_price = $10, margin = $11, sale_price = $12,
                stock_quantity = $13, min_stock = $14, max_stock = $15,
                ncm = $16, cest = $17, cfop = $18, origin = $19, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&sku)
        .bind(clean_code(&payload.barcode))
        .bind(payload.name.trim())
        .bind(&payload.description)
        .bind(payload.unit.trim().to_uppercase())
        .bind(&payload.brand)
        .bind(&payload.category)
        .bind(payload.cost_price)
        .bind(payload.margin)
        .bind(payload.effective_sale_price())
        .bind(payload.stock_quantity)
        .bind(payload.min_stock)
        .bind(payload.max_stock)
        .bind(clean_code(&payload.ncm))
        .bind(clean_code(&payload.cest))
        .bind(clean_code(&payload.cfop))
        .bind(payload.origin)
        .fetch_optional(conn)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::SkuAlreadyExists(sku.clone())))?
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
