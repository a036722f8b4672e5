// src/handlers/lookup.rs

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    common::error::ApiError, config::AppState, middleware::i18n::Locale,
    services::address_lookup::PostalAddress,
};

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Sistema",
    responses((status = 200, description = "Servidor no ar", body = String))
)]
pub async fn health() -> &'static str {
    "OK"
}

// GET /api/cep/{cep}
#[utoipa::path(
    get,
    path = "/api/cep/{cep}",
    tag = "Endereço",
    params(("cep" = String, Path, description = "CEP com ou sem máscara", example = "01310-100")),
    responses(
        (status = 200, description = "Endereço encontrado, ou null se o CEP não existe ou o ViaCEP está fora", body = Option<PostalAddress>),
        (status = 400, description = "CEP mal formado")
    ),
    security(("api_jwt" = []))
)]
pub async fn lookup_cep(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(cep): Path<String>,
) -> Result<Json<Option<PostalAddress>>, ApiError> {
    let address = app_state
        .address_lookup
        .lookup(&cep)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(address))
}
