// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::common::validation::FieldErrors;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Erros de validação já achatados por caminho (ex: "addresses.0.zipcode")
    #[error("Erro de validação")]
    FieldValidation(FieldErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Token de redefinição inválido ou expirado")]
    InvalidResetToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Cabeçalho x-tenant-id ausente ou inválido")]
    MissingTenant,

    #[error("Usuário sem acesso ao tenant")]
    TenantAccessDenied,

    #[error("Permissão necessária: {0}")]
    PermissionDenied(String),

    #[error("Registro não encontrado: {0}")]
    NotFound(&'static str),

    #[error("Documento já cadastrado: {0}")]
    DocumentAlreadyExists(String),

    #[error("SKU já cadastrado: {0}")]
    SkuAlreadyExists(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Transição inválida no assistente de pagamento: {0}")]
    InvalidTransition(String),

    #[error("Nada para exportar")]
    EmptyExport,

    #[error("Exportação acima de {0} linhas")]
    ExportTooLarge(i64),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Falha no gateway de pagamento: {0}")]
    PaymentGateway(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Erro pronto para a resposta HTTP, já traduzido.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Status HTTP e chave de mensagem no catálogo de traduções.
    fn status_and_key(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) | AppError::FieldValidation(_) => {
                (StatusCode::BAD_REQUEST, "errors.validation")
            }
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "errors.email_exists"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "errors.invalid_credentials"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "errors.invalid_token"),
            AppError::InvalidResetToken => (StatusCode::BAD_REQUEST, "errors.invalid_reset_token"),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "errors.user_not_found"),
            AppError::MissingTenant => (StatusCode::BAD_REQUEST, "errors.missing_tenant"),
            AppError::TenantAccessDenied => (StatusCode::FORBIDDEN, "errors.tenant_access_denied"),
            AppError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "errors.permission_denied"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "errors.not_found"),
            AppError::DocumentAlreadyExists(_) => (StatusCode::CONFLICT, "errors.document_exists"),
            AppError::SkuAlreadyExists(_) => (StatusCode::CONFLICT, "errors.sku_exists"),
            AppError::UniqueConstraintViolation(_) => (StatusCode::CONFLICT, "errors.unique_violation"),
            AppError::InvalidTransition(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "errors.invalid_transition")
            }
            AppError::EmptyExport => (StatusCode::UNPROCESSABLE_ENTITY, "errors.empty_export"),
            AppError::ExportTooLarge(_) => (StatusCode::UNPROCESSABLE_ENTITY, "errors.export_too_large"),
            AppError::PaymentGateway(_) => (StatusCode::BAD_GATEWAY, "errors.payment_gateway"),
            AppError::DatabaseError(sqlx::Error::RowNotFound) => {
                (StatusCode::NOT_FOUND, "errors.not_found")
            }
            AppError::JwtError(_) => (StatusCode::UNAUTHORIZED, "errors.invalid_token"),
            AppError::FontNotFound(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "errors.internal"),
        }
    }

    /// Converte o erro de domínio numa resposta traduzida para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let (status, key) = self.status_and_key();
        let lang = locale.0.as_str();

        if status.is_server_error() {
            // O detalhe fica só no log
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let argument = match &self {
            AppError::PermissionDenied(slug) => Some(slug.clone()),
            AppError::NotFound(entity) => Some(entity.to_string()),
            AppError::DocumentAlreadyExists(doc) => Some(doc.clone()),
            AppError::SkuAlreadyExists(sku) => Some(sku.clone()),
            AppError::UniqueConstraintViolation(what) => Some(what.clone()),
            AppError::InvalidTransition(reason) => Some(reason.clone()),
            AppError::PaymentGateway(reason) => Some(reason.clone()),
            AppError::ExportTooLarge(limit) => Some(limit.to_string()),
            _ => None,
        };

        let error = match argument {
            Some(arg) => i18n.translate_with(lang, key, &[arg.as_str()]),
            None => i18n.translate(lang, key),
        };

        let details = match self {
            AppError::ValidationError(errors) => {
                Some(FieldErrors::from_validator(&errors).to_json(lang, i18n))
            }
            AppError::FieldValidation(errors) => Some(errors.to_json(lang, i18n)),
            _ => None,
        };

        ApiError { status, error, details }
    }
}

/// Mapeia violação de unicidade do Postgres para o erro de domínio; o resto vira DatabaseError.
pub(crate) fn map_unique_violation(e: sqlx::Error, on_unique: impl FnOnce() -> AppError) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt() -> Locale {
        Locale("pt".to_string())
    }

    #[test]
    fn field_errors_become_bad_request_with_details() {
        let store = I18nStore::embedded();
        let mut errors = FieldErrors::new();
        errors.add("addresses.0.zipcode", "invalid_zipcode");

        let api = AppError::FieldValidation(errors).to_api_error(&pt(), &store);

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert!(details.get("addresses.0.zipcode").is_some());
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let store = I18nStore::embedded();
        let api = AppError::DatabaseError(sqlx::Error::RowNotFound).to_api_error(&pt(), &store);
        assert_eq!(api.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn empty_export_is_unprocessable() {
        let store = I18nStore::embedded();
        let api = AppError::EmptyExport.to_api_error(&pt(), &store);
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(api.details.is_none());
    }

    #[test]
    fn oversized_export_names_the_limit() {
        let store = I18nStore::embedded();
        let api = AppError::ExportTooLarge(10_000).to_api_error(&pt(), &store);
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(api.error.contains("10000"));
    }

    #[test]
    fn internal_errors_hide_the_cause() {
        let store = I18nStore::embedded();
        let api = AppError::InternalServerError(anyhow::anyhow!("segredo"))
            .to_api_error(&pt(), &store);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("segredo"));
    }

    #[test]
    fn permission_denied_mentions_the_slug() {
        let store = I18nStore::embedded();
        let api = AppError::PermissionDenied("clients:write".into()).to_api_error(&pt(), &store);
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert!(api.error.contains("clients:write"));
    }
}
