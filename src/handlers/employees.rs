// src/handlers/employees.rs

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
        rbac::{PermEmployeesRead, PermEmployeesWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        employee::{Employee, EmployeePayload},
        listing::{ExportFormat, ListParams, Page},
        records::{BulkStatusPayload, BulkStatusResponse, StatusPayload},
    },
};

// GET /api/funcionarios
#[utoipa::path(
    get,
    path = "/api/funcionarios",
    tag = "Funcionários",
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa"),
        ("pagina" = Option<u32>, Query, description = "Página (1-indexada)"),
        ("limite" = Option<u32>, Query, description = "Itens por página (máx. 100)"),
        ("ordenarPor" = Option<String>, Query, description = "Campo de ordenação"),
        ("ordem" = Option<String>, Query, description = "ascend | descend"),
        ("busca" = Option<String>, Query, description = "Busca livre")
    ),
    responses(
        (status = 200, description = "Página de funcionários", body = Page<Employee>),
        (status = 401, description = "Token ausente ou inválido"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermEmployeesRead>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let params = ListParams::from_query(query)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let page = app_state
        .employee_service
        .list(&mut tx, tenant.0, &params)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(Json(page))
}

// GET /api/funcionarios/exportar
#[utoipa::path(
    get,
    path = "/api/funcionarios/exportar",
    tag = "Funcionários",
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa"),
        ("formato" = Option<String>, Query, description = "csv | xlsx | pdf (padrão: csv)")
    ),
    responses(
        (status = 200, description = "Arquivo funcionarios_AAAA-MM-DD.ext", content_type = "application/octet-stream"),
        (status = 400, description = "Formato ou data de filtro inválidos"),
        (status = 422, description = "Nenhum registro para exportar ou acima do teto de linhas")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_employees(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermEmployeesRead>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let params = ListParams::from_query(query)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let format = params.format.unwrap_or(ExportFormat::Csv);
    let api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let rows = app_state.employee_service.export_rows(&mut tx, tenant.0, &params).await.map_err(api)?;
    commit(tx, &app_state, &locale).await?;

    let file = app_state
        .export_service
        .export("funcionarios", "Funcionários", format, &rows)
        .map_err(api)?;
    Ok(export_response(file))
}

// GET /api/funcionarios/{id}
#[utoipa::path(
    get,
    path = "/api/funcionarios/{id}",
    tag = "Funcionários",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 200, body = Employee), (status = 404, description = "Funcionário não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn get_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermEmployeesRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let row = app_state
        .employee_service
        .get(&mut tx, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(Json(row))
}

// POST /api/funcionarios
#[utoipa::path(
    post,
    path = "/api/funcionarios",
    tag = "Funcionários",
    request_body = EmployeePayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses(
        (status = 201, description = "Funcionário criado", body = Employee),
        (status = 400, description = "Campos inválidos"),
        (status = 409, description = "CPF já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermEmployeesWrite>,
    AppJson(payload): AppJson<EmployeePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let row = app_state
        .employee_service
        .create(&mut tx, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

// PUT /api/funcionarios/{id}
#[utoipa::path(
    put,
    path = "/api/funcionarios/{id}",
    tag = "Funcionários",
    request_body = EmployeePayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 200, body = Employee), (status = 400), (status = 404), (status = 409)),
    security(("api_jwt" = []))
)]
pub async fn update_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermEmployeesWrite>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<EmployeePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let row = app_state
        .employee_service
        .update(&mut tx, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(Json(row))
}

// PATCH /api/funcionarios/{id}/status
#[utoipa::path(
    patch,
    path = "/api/funcionarios/{id}/status",
    tag = "Funcionários",
    request_body = StatusPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 204, description = "Status alterado"), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn set_employee_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermEmployeesWrite>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<StatusPayload>,
) -> Result<StatusCode, ApiError> {
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    app_state
        .employee_service
        .set_status(&mut tx, tenant.0, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(StatusCode::NO_CONTENT)
}

// PATCH /api/funcionarios/status
#[utoipa::path(
    patch,
    path = "/api/funcionarios/status",
    tag = "Funcionários",
    request_body = BulkStatusPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses(
        (status = 200, body = BulkStatusResponse),
        (status = 404, description = "Algum id não existe; nada foi alterado")
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_employee_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermEmployeesWrite>,
    AppJson(payload): AppJson<BulkStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);
    payload.validate().map_err(|e| api(e.into()))?;

    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let updated = app_state
        .employee_service
        .bulk_set_status(&mut tx, tenant.0, &payload.ids, payload.status)
        .await
        .map_err(api)?;
    commit(tx, &app_state, &locale).await?;
    Ok(Json(BulkStatusResponse { updated, status: payload.status }))
}

// DELETE /api/funcionarios/{id}
#[utoipa::path(
    delete,
    path = "/api/funcionarios/{id}",
    tag = "Funcionários",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa"), ("id" = Uuid, Path)),
    responses((status = 204, description = "Removido"), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn delete_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermEmployeesWrite>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    app_state
        .employee_service
        .delete(&mut tx, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(StatusCode::NO_CONTENT)
}
