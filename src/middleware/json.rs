// src/middleware/json.rs

use axum::{
    body::Bytes,
    extract::{FromRef, FromRequest, Request},
    http::{header, HeaderMap},
};
use serde::de::DeserializeOwned;
use serde_path_to_error::{Path, Segment};

use crate::{
    common::{
        error::{ApiError, AppError},
        validation::FieldErrors,
    },
    config::AppState,
    middleware::i18n::Locale,
};

/// Corpo JSON cujo erro de desserialização sai como 400 com o caminho do campo.
#[derive(Debug, Clone)]
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(req.headers());
        let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

        if !is_json(req.headers()) {
            return Err(to_api(body_error("invalid_content_type")));
        }
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| to_api(body_error("invalid_json")))?;

        decode(&bytes).map(AppJson).map_err(to_api)
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .is_some_and(|mime| mime == "application/json" || mime.ends_with("+json"))
}

fn body_error(code: &str) -> AppError {
    let mut errors = FieldErrors::new();
    errors.add("body", code);
    AppError::FieldValidation(errors)
}

/// Desserializa e, se falhar, aponta o campo: `addresses.0.zipcode`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    let deserializer = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let inner = err.inner();
        if inner.is_syntax() || inner.is_eof() || inner.is_io() {
            return body_error("invalid_json");
        }

        let mut path = dotted(err.path());
        // "missing field `cpf`" vem no objeto pai; o erro é do próprio campo
        let message = inner.to_string();
        let code = match missing_field(&message) {
            Some(field) => {
                path = if path.is_empty() { field.to_string() } else { format!("{}.{}", path, field) };
                "required"
            }
            None => "invalid_value",
        };
        if path.is_empty() {
            path = "body".to_string();
        }

        let mut errors = FieldErrors::new();
        errors.add(path, code);
        AppError::FieldValidation(errors)
    })
}

fn dotted(path: &Path) -> String {
    path.iter()
        .filter_map(|segment| match segment {
            Segment::Seq { index } => Some(index.to_string()),
            Segment::Map { key } => Some(key.clone()),
            Segment::Enum { variant } => Some(variant.clone()),
            Segment::Unknown => None,
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn missing_field(message: &str) -> Option<&str> {
    message.strip_prefix("missing field `")?.split('`').next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rust_decimal::Decimal;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    #[allow(dead_code)]
    struct Address {
        zipcode: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    #[allow(dead_code)]
    struct Record {
        name: String,
        credit_limit: Option<Decimal>,
        #[serde(default)]
        addresses: Vec<Address>,
    }

    fn failing_paths(body: &str) -> Vec<(String, Vec<String>)> {
        match decode::<Record>(body.as_bytes()) {
            Err(AppError::FieldValidation(errors)) => errors
                .paths()
                .map(|p| (p.to_string(), errors.codes(p).to_vec()))
                .collect(),
            other => panic!("esperava erro de campo, veio {:?}", other),
        }
    }

    #[test]
    fn wrong_type_points_at_the_field() {
        assert_eq!(
            failing_paths(r#"{"name":"Ana","creditLimit":"abc"}"#),
            vec![("creditLimit".to_string(), vec!["invalid_value".to_string()])]
        );
    }

    #[test]
    fn nested_index_is_dotted() {
        let paths = failing_paths(r#"{"name":"Ana","addresses":[{"zipcode":"1"},{"zipcode":2}]}"#);
        assert_eq!(paths[0].0, "addresses.1.zipcode");
    }

    #[test]
    fn missing_field_is_required() {
        assert_eq!(
            failing_paths(r#"{"creditLimit":10}"#),
            vec![("name".to_string(), vec!["required".to_string()])]
        );
    }

    #[test]
    fn broken_json_is_reported_on_body() {
        assert_eq!(
            failing_paths(r#"{"name":"#),
            vec![("body".to_string(), vec!["invalid_json".to_string()])]
        );
    }

    #[test]
    fn accepts_json_content_types_only() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert!(is_json(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(&headers));
    }
}
