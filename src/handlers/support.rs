// src/handlers/support.rs
//
// Peças comuns dos handlers de cadastro: transação com RLS e resposta de exportação.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use sqlx::{Postgres, Transaction};

use crate::{
    common::{db_utils::begin_tenant_tx, error::ApiError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    services::export_service::ExportFile,
};

/// Transação do tenant, com o erro já traduzido.
pub(crate) async fn tenant_tx(
    app_state: &AppState,
    locale: &Locale,
    tenant: &TenantContext,
    user: &AuthenticatedUser,
) -> Result<Transaction<'static, Postgres>, ApiError> {
    begin_tenant_tx(&app_state.db_pool, tenant, user)
        .await
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))
}

pub(crate) async fn commit(
    tx: Transaction<'static, Postgres>,
    app_state: &AppState,
    locale: &Locale,
) -> Result<(), ApiError> {
    tx.commit()
        .await
        .map_err(|e| crate::common::error::AppError::from(e).to_api_error(locale, &app_state.i18n_store))
}

/// Arquivo como anexo: `Content-Disposition: attachment; filename="clientes_2025-03-07.csv"`.
pub(crate) fn export_response(file: ExportFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file.filename)),
        ],
        file.bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_response_sets_attachment_headers() {
        let response = export_response(ExportFile {
            filename: "clientes_2025-03-07.csv".into(),
            content_type: "text/csv; charset=utf-8",
            bytes: b"Nome\n".to_vec(),
        });
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"clientes_2025-03-07.csv\""
        );
    }
}
