// src/handlers/parties.rs
//
// Clientes e fornecedores: as mesmas operações, cada rota com a sua permissão.

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
        rbac::{PermClientsRead, PermClientsWrite, PermSuppliersRead, PermSuppliersWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        listing::{ExportFormat, ListParams, Page},
        party::{Party, PartyPayload},
        records::{BulkStatusPayload, BulkStatusResponse, StatusPayload},
    },
    services::party_service::PartyService,
};

// =============================================================================
//  OPERAÇÕES COMPARTILHADAS
// =============================================================================

async fn list(
    app_state: &AppState,
    service: &PartyService,
    locale: &Locale,
    tenant: &TenantContext,
    user: &AuthenticatedUser,
    query: HashMap<String, String>,
) -> Result<Json<Page<Party>>, ApiError> {
    let params = ListParams::from_query(query)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let mut tx = tenant_tx(app_state, locale, tenant, user).await?;
    let page = service
        .list(&mut tx, tenant.0, &params)
        .await
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))?;
    commit(tx, app_state, locale).await?;
    Ok(Json(page))
}

async fn export(
    app_state: &AppState,
    service: &PartyService,
    locale: &Locale,
    tenant: &TenantContext,
    user: &AuthenticatedUser,
    query: HashMap<String, String>,
) -> Result<Response, ApiError> {
    let params = ListParams::from_query(query)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let format = params.format.unwrap_or(ExportFormat::Csv);
    let api = |e: AppError| e.to_api_error(locale, &app_state.i18n_store);

    let mut tx = tenant_tx(app_state, locale, tenant, user).await?;
    let rows = service.export_rows(&mut tx, tenant.0, &params).await.map_err(api)?;
    commit(tx, app_state, locale).await?;

    let kind = service.kind();
    let file = app_state
        .export_service
        .export(kind.entity(), kind.label(), format, &rows)
        .map_err(api)?;
    Ok(export_response(file))
}

async fn get(
    app_state: &AppState,
    service: &PartyService,
    locale: &Locale,
    tenant: &TenantContext,
    user: &AuthenticatedUser,
    id: Uuid,
) -> Result<Json<Party>, ApiError> {
    let mut tx = tenant_tx(app_state, locale, tenant, user).await?;
    let party = service
        .get(&mut tx, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))?;
    commit(tx, app_state, locale).await?;
    Ok(Json(party))
}

async fn create(
    app_state: &AppState,
    service: &PartyService,
    locale: &Locale,
    tenant: &TenantContext,
    user: &AuthenticatedUser,
    payload: PartyPayload,
) -> Result<(StatusCode, Json<Party>), ApiError> {
    let mut tx = tenant_tx(app_state, locale, tenant, user).await?;
    let party = service
        .create(&mut tx, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))?;
    commit(tx, app_state, locale).await?;
    Ok((StatusCode::CREATED, Json(party)))
}

async fn update(
    app_state: &AppState,
    service: &PartyService,
    locale: &Locale,
    tenant: &TenantContext,
    user: &AuthenticatedUser,
    id: Uuid,
    payload: PartyPayload,
) -> Result<Json<Party>, ApiError> {
    let mut tx = tenant_tx(app_state, locale, tenant, user).await?;
    let party = service
        .update(&mut tx, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))?;
    commit(tx, app_state, locale).await?;
    Ok(Json(party))
}

async fn set_status(
    app_state: &AppState,
    service: &PartyService,
    locale: &Locale,
    tenant: &TenantContext,
    user: &AuthenticatedUser,
    id: Uuid,
    payload: StatusPayload,
) -> Result<StatusCode, ApiError> {
    let mut tx = tenant_tx(app_state, locale, tenant, user).await?;
    service
        .set_status(&mut tx, tenant.0, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))?;
    commit(tx, app_state, locale).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn bulk_status(
    app_state: &AppState,
    service: &PartyService,
    locale: &Locale,
    tenant: &TenantContext,
    user: &AuthenticatedUser,
    payload: BulkStatusPayload,
) -> Result<Json<BulkStatusResponse>, ApiError> {
    let api = |e: AppError| e.to_api_error(locale, &app_state.i18n_store);
    payload.validate().map_err(|e| api(e.into()))?;

    // Tudo ou nada: erro descarta a transação
    let mut tx = tenant_tx(app_state, locale, tenant, user).await?;
    let updated = service
        .bulk_set_status(&mut tx, tenant.0, &payload.ids, payload.status)
        .await
        .map_err(api)?;
    commit(tx, app_state, locale).await?;
    Ok(Json(BulkStatusResponse { updated, status: payload.status }))
}

async fn delete(
    app_state: &AppState,
    service: &PartyService,
    locale: &Locale,
    tenant: &TenantContext,
    user: &AuthenticatedUser,
    id: Uuid,
) -> Result<StatusCode, ApiError> {
    let mut tx = tenant_tx(app_state, locale, tenant, user).await?;
    service
        .delete(&mut tx, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))?;
    commit(tx, app_state, locale).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CLIENTES
// =============================================================================

// GET /api/clientes
#[utoipa::path(
    get,
    path = "/api/clientes",
    tag = "Clientes",
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa"),
        ("pagina" = Option<u32>, Query, description = "Página (1-indexada)"),
        ("limite" = Option<u32>, Query, description = "Itens por página (máx. 100)"),
        ("ordenarPor" = Option<String>, Query, description = "Campo de ordenação"),
        ("ordem" = Option<String>, Query, description = "ascend | descend"),
        ("busca" = Option<String>, Query, description = "Busca livre em nome, documento e e-mail")
    ),
    responses(
        (status = 200, description = "Página de clientes", body = Page<Party>),
        (status = 401, description = "Token ausente ou inválido"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermClientsRead>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    list(&app_state, &app_state.client_service, &locale, &tenant, &user, query).await
}

// GET /api/clientes/exportar
#[utoipa::path(
    get,
    path = "/api/clientes/exportar",
    tag = "Clientes",
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa"),
        ("formato" = Option<String>, Query, description = "csv | xlsx | pdf (padrão: csv)")
    ),
    responses(
        (status = 200, description = "Arquivo clientes_AAAA-MM-DD.ext", content_type = "application/octet-stream"),
        (status = 400, description = "Formato ou data de filtro inválidos"),
        (status = 422, description = "Nenhum registro para exportar ou acima do teto de linhas")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermClientsRead>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    export(&app_state, &app_state.client_service, &locale, &tenant, &user, query).await
}

// GET /api/clientes/{id}
#[utoipa::path(
    get,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 200, body = Party), (status = 404, description = "Cliente não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermClientsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    get(&app_state, &app_state.client_service, &locale, &tenant, &user, id).await
}

// POST /api/clientes
#[utoipa::path(
    post,
    path = "/api/clientes",
    tag = "Clientes",
    request_body = PartyPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses(
        (status = 201, description = "Cliente criado", body = Party),
        (status = 400, description = "Campos inválidos, com detalhes por caminho (ex: addresses.0.zipcode)"),
        (status = 409, description = "Documento já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermClientsWrite>,
    AppJson(payload): AppJson<PartyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    create(&app_state, &app_state.client_service, &locale, &tenant, &user, payload).await
}

// PUT /api/clientes/{id}
#[utoipa::path(
    put,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    request_body = PartyPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 200, body = Party), (status = 400), (status = 404), (status = 409)),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermClientsWrite>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<PartyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    update(&app_state, &app_state.client_service, &locale, &tenant, &user, id, payload).await
}

// PATCH /api/clientes/{id}/status
#[utoipa::path(
    patch,
    path = "/api/clientes/{id}/status",
    tag = "Clientes",
    request_body = StatusPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 204, description = "Status alterado"), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn set_client_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermClientsWrite>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<StatusPayload>,
) -> Result<StatusCode, ApiError> {
    set_status(&app_state, &app_state.client_service, &locale, &tenant, &user, id, payload).await
}

// PATCH /api/clientes/status
#[utoipa::path(
    patch,
    path = "/api/clientes/status",
    tag = "Clientes",
    request_body = BulkStatusPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses(
        (status = 200, body = BulkStatusResponse),
        (status = 404, description = "Algum id não existe; nada foi alterado")
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_client_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermClientsWrite>,
    AppJson(payload): AppJson<BulkStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    bulk_status(&app_state, &app_state.client_service, &locale, &tenant, &user, payload).await
}

// DELETE /api/clientes/{id}
#[utoipa::path(
    delete,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 204, description = "Removido"), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermClientsWrite>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    delete(&app_state, &app_state.client_service, &locale, &tenant, &user, id).await
}

// =============================================================================
//  FORNECEDORES
// =============================================================================

// GET /api/fornecedores
#[utoipa::path(
    get,
    path = "/api/fornecedores",
    tag = "Fornecedores",
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa"),
        ("pagina" = Option<u32>, Query, description = "Página (1-indexada)"),
        ("limite" = Option<u32>, Query, description = "Itens por página (máx. 100)"),
        ("ordenarPor" = Option<String>, Query, description = "Campo de ordenação"),
        ("ordem" = Option<String>, Query, description = "ascend | descend")
    ),
    responses((status = 200, description = "Página de fornecedores", body = Page<Party>)),
    security(("api_jwt" = []))
)]
pub async fn list_suppliers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermSuppliersRead>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    list(&app_state, &app_state.supplier_service, &locale, &tenant, &user, query).await
}

// GET /api/fornecedores/exportar
#[utoipa::path(
    get,
    path = "/api/fornecedores/exportar",
    tag = "Fornecedores",
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa"),
        ("formato" = Option<String>, Query, description = "csv | xlsx | pdf (padrão: csv)")
    ),
    responses(
        (status = 200, description = "Arquivo fornecedores_AAAA-MM-DD.ext", content_type = "application/octet-stream"),
        (status = 400, description = "Formato ou data de filtro inválidos"),
        (status = 422, description = "Nenhum registro para exportar ou acima do teto de linhas")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_suppliers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermSuppliersRead>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    export(&app_state, &app_state.supplier_service, &locale, &tenant, &user, query).await
}

// GET /api/fornecedores/{id}
#[utoipa::path(
    get,
    path = "/api/fornecedores/{id}",
    tag = "Fornecedores",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 200, body = Party), (status = 404, description = "Fornecedor não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn get_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermSuppliersRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    get(&app_state, &app_state.supplier_service, &locale, &tenant, &user, id).await
}

// POST /api/fornecedores
#[utoipa::path(
    post,
    path = "/api/fornecedores",
    tag = "Fornecedores",
    request_body = PartyPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses((status = 201, body = Party), (status = 400), (status = 409)),
    security(("api_jwt" = []))
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermSuppliersWrite>,
    AppJson(payload): AppJson<PartyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    create(&app_state, &app_state.supplier_service, &locale, &tenant, &user, payload).await
}

// PUT /api/fornecedores/{id}
#[utoipa::path(
    put,
    path = "/api/fornecedores/{id}",
    tag = "Fornecedores",
    request_body = PartyPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 200, body = Party), (status = 400), (status = 404), (status = 409)),
    security(("api_jwt" = []))
)]
pub async fn update_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermSuppliersWrite>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<PartyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    update(&app_state, &app_state.supplier_service, &locale, &tenant, &user, id, payload).await
}

// PATCH /api/fornecedores/{id}/status
#[utoipa::path(
    patch,
    path = "/api/fornecedores/{id}/status",
    tag = "Fornecedores",
    request_body = StatusPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 204, description = "Status alterado"), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn set_supplier_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermSuppliersWrite>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<StatusPayload>,
) -> Result<StatusCode, ApiError> {
    set_status(&app_state, &app_state.supplier_service, &locale, &tenant, &user, id, payload).await
}

// PATCH /api/fornecedores/status
#[utoipa::path(
    patch,
    path = "/api/fornecedores/status",
    tag = "Fornecedores",
    request_body = BulkStatusPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses((status = 200, body = BulkStatusResponse), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn bulk_supplier_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermSuppliersWrite>,
    AppJson(payload): AppJson<BulkStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    bulk_status(&app_state, &app_state.supplier_service, &locale, &tenant, &user, payload).await
}

// DELETE /api/fornecedores/{id}
#[utoipa::path(
    delete,
    path = "/api/fornecedores/{id}",
    tag = "Fornecedores",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 204, description = "Removido"), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn delete_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermSuppliersWrite>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    delete(&app_state, &app_state.supplier_service, &locale, &tenant, &user, id).await
}
