// src/common/i18n.rs

use std::collections::HashMap;

const DEFAULT_LANG: &str = "pt";

/// Catálogos de mensagens por idioma ("pt", "en"), embutidos no binário.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn embedded() -> Self {
        let mut catalogs = HashMap::new();
        for (lang, raw) in [
            ("pt", include_str!("../../locales/pt.json")),
            ("en", include_str!("../../locales/en.json")),
        ] {
            match serde_json::from_str::<HashMap<String, String>>(raw) {
                Ok(messages) => {
                    catalogs.insert(lang.to_string(), messages);
                }
                Err(e) => tracing::error!("Catálogo de idioma '{}' inválido: {}", lang, e),
            }
        }
        Self { catalogs }
    }

    /// Busca a mensagem no idioma pedido, depois no padrão; sem tradução devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANG, key))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Igual a `translate`, substituindo `{0}`, `{1}`... pelos argumentos.
    pub fn translate_with(&self, lang: &str, key: &str, args: &[&str]) -> String {
        args.iter()
            .enumerate()
            .fold(self.translate(lang, key), |msg, (i, arg)| {
                msg.replace(&format!("{{{}}}", i), arg)
            })
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.catalogs
            .get(lang)
            .and_then(|messages| messages.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_portuguese_then_key() {
        let store = I18nStore::embedded();
        assert_eq!(
            store.translate("fr", "errors.empty_export"),
            store.translate("pt", "errors.empty_export")
        );
        assert_eq!(store.translate("en", "no.such.key"), "no.such.key");
    }

    #[test]
    fn english_catalog_differs() {
        let store = I18nStore::embedded();
        assert_ne!(
            store.translate("en", "errors.invalid_token"),
            store.translate("pt", "errors.invalid_token")
        );
    }

    #[test]
    fn substitutes_arguments() {
        let store = I18nStore::embedded();
        let msg = store.translate_with("en", "errors.permission_denied", &["products:write"]);
        assert!(msg.contains("products:write"));
    }
}
