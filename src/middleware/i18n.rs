// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

const DEFAULT_LANG: &str = "pt";
const SUPPORTED: &[&str] = &["pt", "en"];

/// Idioma do cliente, tirado do Accept-Language ("pt-BR" -> "pt").
#[derive(Debug, Clone, PartialEq)]
pub struct Locale(pub String);

impl Locale {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let lang = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(|header_str| {
                // Primeiro idioma suportado, na ordem de preferência do cliente
                accept_language::parse(header_str).into_iter().find_map(|tag| {
                    let primary = tag.split('-').next().unwrap_or(&tag).to_lowercase();
                    SUPPORTED.contains(&primary.as_str()).then_some(primary)
                })
            })
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn picks_primary_subtag() {
        assert_eq!(Locale::from_headers(&headers("pt-BR,pt;q=0.9,en;q=0.8")).0, "pt");
        assert_eq!(Locale::from_headers(&headers("en-US")).0, "en");
    }

    #[test]
    fn unsupported_or_missing_falls_back_to_portuguese() {
        assert_eq!(Locale::from_headers(&headers("fr-FR")).0, "pt");
        assert_eq!(Locale::from_headers(&HeaderMap::new()).0, "pt");
    }

    #[test]
    fn skips_unsupported_in_favor_of_next() {
        assert_eq!(Locale::from_headers(&headers("de-DE,en;q=0.5")).0, "en");
    }
}
