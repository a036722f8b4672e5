// src/services/address_lookup.rs
//
// Consulta de CEP no ViaCEP. Falha aberta: se o serviço cair, o formulário segue manual.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::{documents, error::AppError, validation::FieldErrors};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    #[schema(example = "01310100")]
    pub zipcode: String,
    #[schema(example = "Avenida Paulista")]
    pub street: String,
    pub complement: Option<String>,
    #[schema(example = "Bela Vista")]
    pub district: Option<String>,
    #[schema(example = "São Paulo")]
    pub city: String,
    #[schema(example = "SP")]
    pub state: String,
}

#[derive(Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    erro: Option<serde_json::Value>,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    complemento: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

impl ViaCepResponse {
    fn into_address(self, zipcode: String) -> Option<PostalAddress> {
        // ViaCEP responde 200 com {"erro": true} (ou "true") para CEP inexistente
        if self.erro.is_some() || self.localidade.is_empty() {
            return None;
        }
        Some(PostalAddress {
            zipcode,
            street: self.logradouro,
            complement: non_empty(self.complemento),
            district: non_empty(self.bairro),
            city: self.localidade,
            state: self.uf,
        })
    }
}

#[derive(Clone)]
pub struct AddressLookup {
    client: reqwest::Client,
    base_url: String,
}

impl AddressLookup {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `Ok(None)` tanto para CEP inexistente quanto para ViaCEP fora do ar.
    pub async fn lookup(&self, cep: &str) -> Result<Option<PostalAddress>, AppError> {
        let zipcode = documents::only_digits(cep);
        if !documents::is_valid_zipcode(&zipcode) {
            let mut errors = FieldErrors::new();
            errors.add("cep", "invalid_zipcode");
            return Err(AppError::FieldValidation(errors));
        }

        let url = format!("{}/ws/{}/json/", self.base_url, zipcode);
        let resp = match self.client.get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!("⚠️ ViaCEP respondeu {} para {}", r.status(), zipcode);
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!("⚠️ ViaCEP indisponível: {}", e);
                return Ok(None);
            }
        };

        match resp.json::<ViaCepResponse>().await {
            Ok(body) => Ok(body.into_address(zipcode)),
            Err(e) => {
                tracing::warn!("⚠️ Resposta inesperada do ViaCEP: {}", e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_viacep_fields() {
        let body: ViaCepResponse = serde_json::from_value(json!({
            "cep": "01310-100",
            "logradouro": "Avenida Paulista",
            "complemento": "",
            "bairro": "Bela Vista",
            "localidade": "São Paulo",
            "uf": "SP"
        }))
        .unwrap();
        let address = body.into_address("01310100".into()).unwrap();
        assert_eq!(address.city, "São Paulo");
        assert_eq!(address.state, "SP");
        assert_eq!(address.complement, None);
        assert_eq!(address.district.as_deref(), Some("Bela Vista"));
    }

    #[test]
    fn unknown_cep_yields_none() {
        let body: ViaCepResponse = serde_json::from_value(json!({ "erro": "true" })).unwrap();
        assert!(body.into_address("99999999".into()).is_none());
    }

    #[tokio::test]
    async fn malformed_cep_is_a_field_error() {
        let lookup = AddressLookup::new("http://127.0.0.1:9");
        match lookup.lookup("123").await {
            Err(AppError::FieldValidation(errors)) => assert!(errors.contains("cep")),
            other => panic!("esperava erro de campo, veio {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreachable_service_fails_open() {
        // porta 9 (discard) sem ninguém escutando
        let lookup = AddressLookup::new("http://127.0.0.1:9");
        assert_eq!(lookup.lookup("01310-100").await.unwrap(), None);
    }
}
