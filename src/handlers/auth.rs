// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, json::AppJson},
    models::{
        auth::{
            AuthResponse, LoginUserPayload, MessageResponse, RegisterUserPayload, ResetPasswordConfirmPayload,
            ResetPasswordRequestPayload, ResetRequestedResponse, User,
        },
        tenancy::Tenant,
    },
};

// POST /api/auth/registrar
#[utoipa::path(
    post,
    path = "/api/auth/registrar",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail já em uso")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<RegisterUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);
    payload.validate().map_err(|e| api(e.into()))?;

    let response = app_state.auth_service.register_user(&payload).await.map_err(api)?;

    Ok((StatusCode::CREATED, Json(response)))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login efetuado: token, user e isAdmin", body = AuthResponse),
        (status = 401, description = "E-mail ou senha inválidos")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<LoginUserPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    let api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);
    payload.validate().map_err(|e| api(e.into()))?;

    let response = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await
        .map_err(api)?;

    Ok(Json(response))
}

// POST /api/auth/reset-password/request
#[utoipa::path(
    post,
    path = "/api/auth/reset-password/request",
    tag = "Auth",
    request_body = ResetPasswordRequestPayload,
    responses(
        (status = 200, description = "Mesma resposta exista ou não a conta", body = ResetRequestedResponse)
    )
)]
pub async fn request_password_reset(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<ResetPasswordRequestPayload>,
) -> Result<Json<ResetRequestedResponse>, ApiError> {
    let api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);
    payload.validate().map_err(|e| api(e.into()))?;

    let token = app_state
        .auth_service
        .request_password_reset(&payload.email)
        .await
        .map_err(api)?;

    Ok(Json(ResetRequestedResponse {
        message: app_state.i18n_store.translate(&locale.0, "messages.reset_requested"),
        reset_token: token.filter(|_| app_state.config.expose_reset_token),
    }))
}

// POST /api/auth/reset-password/confirm
#[utoipa::path(
    post,
    path = "/api/auth/reset-password/confirm",
    tag = "Auth",
    request_body = ResetPasswordConfirmPayload,
    responses(
        (status = 200, description = "Senha alterada", body = MessageResponse),
        (status = 400, description = "Token inválido, usado ou expirado")
    )
)]
pub async fn confirm_password_reset(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<ResetPasswordConfirmPayload>,
) -> Result<Json<MessageResponse>, ApiError> {
    let api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);
    payload.validate().map_err(|e| api(e.into()))?;

    app_state
        .auth_service
        .confirm_password_reset(&payload.token, &payload.new_password)
        .await
        .map_err(api)?;

    Ok(Json(MessageResponse {
        message: app_state.i18n_store.translate(&locale.0, "messages.password_changed"),
    }))
}

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Usuário do token", body = User),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

// GET /api/users/me/tenants
#[utoipa::path(
    get,
    path = "/api/users/me/tenants",
    tag = "Users",
    responses((status = 200, description = "Empresas em que o usuário é membro ativo", body = Vec<Tenant>)),
    security(("api_jwt" = []))
)]
pub async fn get_my_tenants(
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
