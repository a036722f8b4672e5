// src/handlers/access_groups.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        json::AppJson,
        rbac::{PermAccessManage, RequirePermission},
        tenancy::TenantContext,
    },
    models::access_group::{AccessGroup, AccessGroupPayload, PermissionInfo, PERMISSIONS},
};

// GET /api/permissions
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "Grupos de acesso",
    responses((status = 200, description = "Catálogo de permissões", body = Vec<PermissionInfo>)),
    security(("api_jwt" = []))
)]
pub async fn list_permissions() -> Json<Vec<PermissionInfo>> {
    Json(PERMISSIONS.to_vec())
}

// GET /api/grupos-acesso
#[utoipa::path(
    get,
    path = "/api/grupos-acesso",
    tag = "Grupos de acesso",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses((status = 200, body = Vec<AccessGroup>)),
    security(("api_jwt" = []))
)]
pub async fn list_groups(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermAccessManage>,
) -> Result<Json<Vec<AccessGroup>>, ApiError> {
    let groups = app_state
        .access_group_service
        .list(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(groups))
}

// GET /api/grupos-acesso/{id}
#[utoipa::path(
    get,
    path = "/api/grupos-acesso/{id}",
    tag = "Grupos de acesso",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 200, body = AccessGroup), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn get_group(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermAccessManage>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccessGroup>, ApiError> {
    let group = app_state
        .access_group_service
        .get(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(group))
}

// POST /api/grupos-acesso
#[utoipa::path(
    post,
    path = "/api/grupos-acesso",
    tag = "Grupos de acesso",
    request_body = AccessGroupPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses(
        (status = 201, body = AccessGroup),
        (status = 400, description = "Nome curto ou permissão desconhecida"),
        (status = 409, description = "Nome já usado nesta empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_group(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermAccessManage>,
    AppJson(payload): AppJson<AccessGroupPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let group = app_state
        .access_group_service
        .create(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::CREATED, Json(group)))
}

// PUT /api/grupos-acesso/{id}
#[utoipa::path(
    put,
    path = "/api/grupos-acesso/{id}",
    tag = "Grupos de acesso",
    request_body = AccessGroupPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 200, body = AccessGroup), (status = 400), (status = 404), (status = 409)),
    security(("api_jwt" = []))
)]
pub async fn update_group(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermAccessManage>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<AccessGroupPayload>,
) -> Result<Json<AccessGroup>, ApiError> {
    let group = app_state
        .access_group_service
        .update(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(group))
}

// DELETE /api/grupos-acesso/{id}
#[utoipa::path(
    delete,
    path = "/api/grupos-acesso/{id}",
    tag = "Grupos de acesso",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 204, description = "Removido; membros do grupo ficam sem grupo"), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn delete_group(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermAccessManage>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .access_group_service
        .delete(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(StatusCode::NO_CONTENT)
}
