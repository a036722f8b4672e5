// src/handlers/payments.rs
//
// Assistente de pagamento. Cada passo lê e grava o rascunho do usuário logado.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::support::{commit, tenant_tx},
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermPaymentsRead, PermPaymentsWrite, RequirePermission},
        json::AppJson,
        tenancy::TenantContext,
    },
    models::{
        listing::{ListParams, Page},
        payment::{DetailsPayload, Payment, PaymentIntake, SelectMethodPayload},
    },
};

// GET /api/pagamentos/intake
#[utoipa::path(
    get,
    path = "/api/pagamentos/intake",
    tag = "Pagamentos",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses((status = 200, description = "Rascunho atual (vazio se não houver)", body = PaymentIntake)),
    security(("api_jwt" = []))
)]
pub async fn get_intake(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermPaymentsWrite>,
) -> Result<Json<PaymentIntake>, ApiError> {
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let state = app_state
        .payment_service
        .current(&mut tx, tenant.0, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(Json(state))
}

// POST /api/pagamentos/intake/metodo
#[utoipa::path(
    post,
    path = "/api/pagamentos/intake/metodo",
    tag = "Pagamentos",
    request_body = SelectMethodPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses(
        (status = 200, description = "Avança para os detalhes", body = PaymentIntake),
        (status = 400, description = "Valor inválido"),
        (status = 422, description = "Fora do passo de escolha do método")
    ),
    security(("api_jwt" = []))
)]
pub async fn select_method(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermPaymentsWrite>,
    AppJson(payload): AppJson<SelectMethodPayload>,
) -> Result<Json<PaymentIntake>, ApiError> {
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let state = app_state
        .payment_service
        .select_method(&mut tx, tenant.0, user.0.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(Json(state))
}

// POST /api/pagamentos/intake/detalhes
#[utoipa::path(
    post,
    path = "/api/pagamentos/intake/detalhes",
    tag = "Pagamentos",
    request_body = DetailsPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses(
        (status = 200, description = "Detalhes aceitos; PIX e boleto já trazem QR code ou linha digitável", body = PaymentIntake),
        (status = 400, description = "Campos inválidos do ramo escolhido"),
        (status = 422, description = "Fora do passo de detalhes ou rascunho alterado em paralelo"),
        (status = 502, description = "Gateway recusou ou não respondeu")
    ),
    security(("api_jwt" = []))
)]
pub async fn enter_details(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermPaymentsWrite>,
    AppJson(payload): AppJson<DetailsPayload>,
) -> Result<Json<PaymentIntake>, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let state = app_state.payment_service.current(&mut tx, tenant.0, user.0.id).await.map_err(to_api)?;
    commit(tx, &app_state, &locale).await?;

    // Gateway sem conexão presa
    let next = app_state.payment_service.issue_details(&state, &payload).await.map_err(to_api)?;

    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    app_state
        .payment_service
        .store_transition(&mut tx, tenant.0, user.0.id, &state, &next)
        .await
        .map_err(to_api)?;
    commit(tx, &app_state, &locale).await?;
    Ok(Json(next))
}

// POST /api/pagamentos/intake/voltar
#[utoipa::path(
    post,
    path = "/api/pagamentos/intake/voltar",
    tag = "Pagamentos",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses((status = 200, description = "Passo anterior; no primeiro passo nada muda", body = PaymentIntake)),
    security(("api_jwt" = []))
)]
pub async fn back(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermPaymentsWrite>,
) -> Result<Json<PaymentIntake>, ApiError> {
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let state = app_state
        .payment_service
        .back(&mut tx, tenant.0, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(Json(state))
}

// DELETE /api/pagamentos/intake
#[utoipa::path(
    delete,
    path = "/api/pagamentos/intake",
    tag = "Pagamentos",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses((status = 200, description = "Rascunho descartado", body = PaymentIntake)),
    security(("api_jwt" = []))
)]
pub async fn reset(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermPaymentsWrite>,
) -> Result<Json<PaymentIntake>, ApiError> {
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let state = app_state
        .payment_service
        .reset(&mut tx, tenant.0, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(Json(state))
}

// POST /api/pagamentos/intake/confirmar
#[utoipa::path(
    post,
    path = "/api/pagamentos/intake/confirmar",
    tag = "Pagamentos",
    params(("x-tenant-id" = Uuid, Header, description = "ID da empresa")),
    responses(
        (status = 201, description = "Pagamento registrado e rascunho apagado", body = Payment),
        (status = 422, description = "Fora do passo de confirmação"),
        (status = 502, description = "Gateway recusou ou não respondeu")
    ),
    security(("api_jwt" = []))
)]
pub async fn confirm(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermPaymentsWrite>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let state = app_state.payment_service.current(&mut tx, tenant.0, user.0.id).await.map_err(to_api)?;
    commit(tx, &app_state, &locale).await?;

    let outcome = app_state.payment_service.charge(&state).await.map_err(to_api)?;

    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let payment = app_state
        .payment_service
        .record(&mut tx, tenant.0, user.0.id, &state, outcome)
        .await
        .map_err(to_api)?;
    commit(tx, &app_state, &locale).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

// GET /api/pagamentos
#[utoipa::path(
    get,
    path = "/api/pagamentos",
    tag = "Pagamentos",
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da empresa"),
        ("pagina" = Option<u32>, Query, description = "Página (1-indexada)"),
        ("limite" = Option<u32>, Query, description = "Itens por página (máx. 100)"),
        ("ordenarPor" = Option<String>, Query, description = "Campo de ordenação"),
        ("ordem" = Option<String>, Query, description = "ascend | descend")
    ),
    responses((status = 200, body = Page<Payment>)),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermPaymentsRead>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Page<Payment>>, ApiError> {
    let params = ListParams::from_query(query)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let mut tx = tenant_tx(&app_state, &locale, &tenant, &user).await?;
    let page = app_state
        .payment_service
        .list(&mut tx, tenant.0, &params)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    commit(tx, &app_state, &locale).await?;
    Ok(Json(page))
}
