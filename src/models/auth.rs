// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "admin@loja.com.br")]
    pub email: String,
    #[schema(example = "Maria Gerente")]
    pub name: String,

    #[serde(skip_serializing)] // nunca sai na resposta
    #[schema(ignore)]
    pub password_hash: String,

    pub phone: Option<String>,
    pub is_admin: bool,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(length(min = 3, message = "min_length"))]
    #[schema(example = "Maria Gerente")]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "admin@loja.com.br")]
    pub email: String,
    #[validate(length(min = 6, message = "min_length"))]
    #[schema(example = "senha123")]
    pub password: String,
    pub phone: Option<String>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "admin@loja.com.br")]
    pub email: String,
    #[validate(length(min = 6, message = "min_length"))]
    #[schema(example = "senha123")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequestPayload {
    #[validate(email(message = "invalid_email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordConfirmPayload {
    #[validate(length(min = 16, message = "required"))]
    pub token: String,
    #[validate(length(min = 6, message = "min_length"))]
    pub new_password: String,
}

// Resposta de autenticação: o front guarda token, user e adm
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// Sem envio de e-mail: o token só volta na resposta quando EXPOSE_RESET_TOKEN está ligado
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequestedResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // ID do usuário
    pub exp: usize, // expiração
    pub iat: usize, // emissão
}
