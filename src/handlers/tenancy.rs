// src/handlers/tenancy.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        json::AppJson,
        rbac::{PermAccessManage, RequirePermission},
        tenancy::TenantContext,
    },
    models::tenancy::{AddMemberPayload, CreateTenantPayload, MemberView, Tenant, TenantMember},
};

// POST /api/tenants
#[utoipa::path(
    post,
    path = "/api/tenants",
    tag = "Tenancy",
    request_body = CreateTenantPayload,
    responses(
        (status = 201, description = "Empresa criada; o criador entra no grupo Administradores", body = Tenant),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppJson(payload): AppJson<CreateTenantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);
    payload.validate().map_err(|e| api(e.into()))?;

    let tenant = app_state
        .tenant_service
        .create_tenant_with_owner(&payload.name, payload.description.as_deref(), user.id)
        .await
        .map_err(api)?;

    Ok((StatusCode::CREATED, Json(tenant)))
}

// GET /api/tenants
#[utoipa::path(
    get,
    path = "/api/tenants",
    tag = "Tenancy",
    responses((status = 200, description = "Empresas do usuário", body = Vec<Tenant>)),
    security(("api_jwt" = []))
)]
pub async fn list_my_tenants(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Tenant>>, ApiError> {
    let tenants = app_state
        .tenant_service
        .list_user_tenants(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(tenants))
}

// POST /api/tenants/members
#[utoipa::path(
    post,
    path = "/api/tenants/members",
    tag = "Tenancy",
    request_body = AddMemberPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses(
        (status = 201, description = "Usuário vinculado (ou reativado)", body = TenantMember),
        (status = 404, description = "E-mail sem conta ou grupo inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_member(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermAccessManage>,
    AppJson(payload): AppJson<AddMemberPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);
    payload.validate().map_err(|e| api(e.into()))?;

    let member = app_state
        .tenant_service
        .add_member(tenant.0, &payload.email, payload.access_group_id)
        .await
        .map_err(api)?;

    Ok((StatusCode::CREATED, Json(member)))
}

// GET /api/tenants/members
#[utoipa::path(
    get,
    path = "/api/tenants/members",
    tag = "Tenancy",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses((status = 200, description = "Equipe da empresa", body = Vec<MemberView>)),
    security(("api_jwt" = []))
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermAccessManage>,
) -> Result<Json<Vec<MemberView>>, ApiError> {
    let members = app_state
        .tenant_service
        .list_members(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(members))
}
