// src/handlers/products.rs

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::support::{commit, export_response, tenant_tx},
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        json::AppJson,
        rbac::{PermProductsRead, PermProductsWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        product::{Product, ProductPayload},
        listing::{ExportFormat, ListParams, Page},
        records::{BulkStatusPayload, BulkStatusResponse, StatusPayload},
    },
};

// GET /produtos
#[utoipa::path(
    get,
    path = "/produtos",
    tag = "Produtos",
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa"),
        ("pagina" = Option<u32>, Query, description = "Página (1-indexada)"),
        ("limite" = Option<u32>, Query, description = "Itens por página (máx. 100)"),
        ("ordenarPor" = Option<String>, Query, description = "Campo de ordenação"),
        ("ordem" = Option<String>, Query, description = "ascend | descend"),
        ("busca" = Option<String>, Query, description = "Busca livre")
    ),
    responses(
        (status = 200, description = "Página de produtos", body = Page<Product>),
        (status = 401, description = "Token ausente ou inválido"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermProductsRead>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let params = ListParams::from_query(query)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let page = app_state
        .product_service
        .list(&mut tx, tenant.0, &params)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(Json(page))
}

// GET /produtos/exportar
#[utoipa::path(
    get,
    path = "/produtos/exportar",
    tag = "Produtos",
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa"),
        ("formato" = Option<String>, Query, description = "csv | xlsx | pdf (padrão: csv)")
    ),
    responses(
        (status = 200, description = "Arquivo produtos_AAAA-MM-DD.ext", content_type = "application/octet-stream"),
        (status = 400, description = "Formato ou data de filtro inválidos"),
        (status = 422, description = "Nenhum registro para exportar ou acima do teto de linhas")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_products(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermProductsRead>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let params = ListParams::from_query(query)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let format = params.format.unwrap_or(ExportFormat::Csv);
    let api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let rows = app_state.product_service.export_rows(&mut tx, tenant.0, &params).await.map_err(api)?;
    commit(tx, &app_state, &locale).await?;

    let file = app_state
        .export_service
        .export("produtos", "Produtos", format, &rows)
        .map_err(api)?;
    Ok(export_response(file))
}

// GET /produtos/{id}
#[utoipa::path(
    get,
    path = "/produtos/{id}",
    tag = "Produtos",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 200, body = Product), (status = 404, description = "Produto não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermProductsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let row = app_state
        .product_service
        .get(&mut tx, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(Json(row))
}

// POST /produtos
#[utoipa::path(
    post,
    path = "/produtos",
    tag = "Produtos",
    request_body = ProductPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Campos inválidos"),
        (status = 409, description = "SKU já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermProductsWrite>,
    AppJson(payload): AppJson<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let row = app_state
        .product_service
        .create(&mut tx, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

// PUT /produtos/{id}
#[utoipa::path(
    put,
    path = "/produtos/{id}",
    tag = "Produtos",
    request_body = ProductPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 200, body = Product), (status = 400), (status = 404), (status = 409)),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermProductsWrite>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let row = app_state
        .product_service
        .update(&mut tx, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(Json(row))
}

// PATCH /produtos/{id}/status
#[utoipa::path(
    patch,
    path = "/produtos/{id}/status",
    tag = "Produtos",
    request_body = StatusPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 204, description = "Status alterado"), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn set_product_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermProductsWrite>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<StatusPayload>,
) -> Result<StatusCode, ApiError> {
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    app_state
        .product_service
        .set_status(&mut tx, tenant.0, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(StatusCode::NO_CONTENT)
}

// PATCH /produtos/status
#[utoipa::path(
    patch,
    path = "/produtos/status",
    tag = "Produtos",
    request_body = BulkStatusPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses(
        (status = 200, body = BulkStatusResponse),
        (status = 404, description = "Algum id não existe; nada foi alterado")
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_product_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermProductsWrite>,
    AppJson(payload): AppJson<BulkStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);
    payload.validate().map_err(|e| api(e.into()))?;

    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let updated = app_state
        .product_service
        .bulk_set_status(&mut tx, tenant.0, &payload.ids, payload.status)
        .await
        .map_err(api)?;
    commit(tx, &app_state, &locale).await?;
    Ok(Json(BulkStatusResponse { updated, status: payload.status }))
}

// DELETE /produtos/{id}
#[utoipa::path(
    delete,
    path = "/produtos/{id}",
    tag = "Produtos",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 204, description = "Removido"), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermProductsWrite>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    app_state
        .product_service
        .delete(&mut tx, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(StatusCode::NO_CONTENT)
}
