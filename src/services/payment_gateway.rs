// src/services/payment_gateway.rs
//
// Cliente do gateway de pagamento (API no formato do Mercado Pago).

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDate, Utc};
use image::{DynamicImage, ImageOutputFormat, Luma};
use qrcode::QrCode;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::{documents, error::AppError},
    models::payment::{CardInput, Payer, PaymentArtifacts, PaymentStatus},
};

/// Cobrança a emitir no gateway.
#[derive(Debug, Clone)]
pub struct ChargeRequest<'a> {
    pub amount: Decimal,
    pub description: Option<&'a str>,
    pub payer: &'a Payer,
    pub idempotency_key: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardToken {
    pub token: String,
    pub last_four: String,
    pub brand: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssuedCharge {
    pub gateway_id: String,
    pub status: PaymentStatus,
    pub artifacts: Option<PaymentArtifacts>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Troca os dados do cartão por um token de uso único.
    async fn tokenize_card(&self, card: &CardInput) -> Result<CardToken, AppError>;

    /// Emite a cobrança PIX; o retorno traz o "copia e cola" e o QR.
    async fn create_pix(&self, charge: &ChargeRequest<'_>) -> Result<IssuedCharge, AppError>;

    async fn create_boleto(&self, charge: &ChargeRequest<'_>, due_date: NaiveDate) -> Result<IssuedCharge, AppError>;

    async fn charge_card(
        &self,
        charge: &ChargeRequest<'_>,
        card: &CardToken,
        installments: u8,
    ) -> Result<IssuedCharge, AppError>;
}

// ---
// Implementação HTTP
// ---

#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

#[derive(Serialize)]
struct CardTokenRequest<'a> {
    card_number: String,
    expiration_month: u32,
    expiration_year: i32,
    security_code: &'a str,
    cardholder: Cardholder<'a>,
}

#[derive(Serialize)]
struct Cardholder<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct CardTokenResponse {
    id: String,
    last_four_digits: Option<String>,
}

#[derive(Serialize)]
struct PaymentRequest<'a> {
    transaction_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    payment_method_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    installments: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_of_expiration: Option<String>,
    payer: PayerBody<'a>,
}

#[derive(Serialize)]
struct PayerBody<'a> {
    email: &'a str,
    first_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    identification: Option<Identification>,
}

#[derive(Serialize)]
struct Identification {
    #[serde(rename = "type")]
    kind: &'static str,
    number: String,
}

#[derive(Deserialize)]
struct PaymentResponse {
    // numérico na API real
    id: serde_json::Value,
    status: String,
    date_of_expiration: Option<DateTime<Utc>>,
    point_of_interaction: Option<PointOfInteraction>,
    transaction_details: Option<TransactionDetails>,
    barcode: Option<Barcode>,
}

#[derive(Deserialize)]
struct PointOfInteraction {
    transaction_data: Option<TransactionData>,
}

#[derive(Deserialize)]
struct TransactionData {
    qr_code: Option<String>,
    qr_code_base64: Option<String>,
}

#[derive(Deserialize)]
struct TransactionDetails {
    external_resource_url: Option<String>,
    digitable_line: Option<String>,
}

#[derive(Deserialize)]
struct Barcode {
    content: Option<String>,
}

impl PaymentResponse {
    fn gateway_id(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl HttpPaymentGateway {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<Uuid>,
    ) -> Result<R, AppError> {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .json(body);
        if let Some(key) = idempotency_key {
            request = request.header("X-Idempotency-Key", key.to_string());
        }

        let resp = request.send().await.map_err(|e| {
            tracing::error!("❌ Gateway inacessível em {}: {}", path, e);
            AppError::PaymentGateway(format!("falha de conexão com o gateway: {}", e))
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!("❌ Gateway respondeu {} em {}: {}", status, path, body);
            return Err(AppError::PaymentGateway(format!("gateway respondeu {}", status)));
        }

        resp.json::<R>()
            .await
            .map_err(|e| AppError::PaymentGateway(format!("resposta inválida do gateway: {}", e)))
    }

    fn payer_body<'a>(payer: &'a Payer) -> PayerBody<'a> {
        let identification = payer.document.as_deref().map(|doc| {
            let number = documents::only_digits(doc);
            let kind = if number.len() == 14 { "CNPJ" } else { "CPF" };
            Identification { kind, number }
        });
        PayerBody {
            email: &payer.email,
            first_name: &payer.name,
            identification,
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn tokenize_card(&self, card: &CardInput) -> Result<CardToken, AppError> {
        let number = documents::only_digits(&card.number);
        let expiration_year = if card.expiry_year < 100 { 2000 + card.expiry_year } else { card.expiry_year };
        let body = CardTokenRequest {
            card_number: number.clone(),
            expiration_month: card.expiry_month,
            expiration_year,
            security_code: &card.cvv,
            cardholder: Cardholder { name: &card.holder_name },
        };

        let resp: CardTokenResponse = self.post("/v1/card_tokens", &body, None).await?;
        let last_four = resp
            .last_four_digits
            .unwrap_or_else(|| number[number.len().saturating_sub(4)..].to_string());

        Ok(CardToken {
            token: resp.id,
            last_four,
            brand: documents::card_brand(&number).to_string(),
        })
    }

    async fn create_pix(&self, charge: &ChargeRequest<'_>) -> Result<IssuedCharge, AppError> {
        let body = PaymentRequest {
            transaction_amount: charge.amount,
            description: charge.description,
            payment_method_id: "pix",
            token: None,
            installments: None,
            date_of_expiration: None,
            payer: Self::payer_body(charge.payer),
        };
        let resp: PaymentResponse = self.post("/v1/payments", &body, Some(charge.idempotency_key)).await?;
        pix_charge(resp)
    }

    async fn create_boleto(&self, charge: &ChargeRequest<'_>, due_date: NaiveDate) -> Result<IssuedCharge, AppError> {
        let body = PaymentRequest {
            transaction_amount: charge.amount,
            description: charge.description,
            payment_method_id: "bolbradesco",
            token: None,
            installments: None,
            date_of_expiration: Some(format!("{}T23:59:59.000-03:00", due_date.format("%Y-%m-%d"))),
            payer: Self::payer_body(charge.payer),
        };
        let resp: PaymentResponse = self.post("/v1/payments", &body, Some(charge.idempotency_key)).await?;
        boleto_charge(resp, due_date)
    }

    async fn charge_card(
        &self,
        charge: &ChargeRequest<'_>,
        card: &CardToken,
        installments: u8,
    ) -> Result<IssuedCharge, AppError> {
        let body = PaymentRequest {
            transaction_amount: charge.amount,
            description: charge.description,
            payment_method_id: &card.brand,
            token: Some(&card.token),
            installments: Some(installments),
            date_of_expiration: None,
            payer: Self::payer_body(charge.payer),
        };
        let resp: PaymentResponse = self.post("/v1/payments", &body, Some(charge.idempotency_key)).await?;
        Ok(IssuedCharge {
            gateway_id: resp.gateway_id(),
            status: PaymentStatus::from_gateway(&resp.status),
            artifacts: None,
        })
    }
}

fn pix_charge(resp: PaymentResponse) -> Result<IssuedCharge, AppError> {
    let data = resp
        .point_of_interaction
        .as_ref()
        .and_then(|p| p.transaction_data.as_ref());
    let qr_payload = data
        .and_then(|d| d.qr_code.clone())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::PaymentGateway("cobrança PIX sem código".to_string()))?;
    // Se o gateway não mandar a imagem, desenha a partir do código emitido
    let qr_code_base64 = match data.and_then(|d| d.qr_code_base64.clone()).filter(|q| !q.is_empty()) {
        Some(image) => image,
        None => render_qr_base64(&qr_payload)?,
    };

    Ok(IssuedCharge {
        gateway_id: resp.gateway_id(),
        status: PaymentStatus::from_gateway(&resp.status),
        artifacts: Some(PaymentArtifacts::Pix {
            qr_payload,
            qr_code_base64,
            expires_at: resp.date_of_expiration,
        }),
    })
}

fn boleto_charge(resp: PaymentResponse, due_date: NaiveDate) -> Result<IssuedCharge, AppError> {
    let barcode = resp
        .barcode
        .as_ref()
        .and_then(|b| b.content.clone())
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::PaymentGateway("boleto sem código de barras".to_string()))?;
    let details = resp.transaction_details.as_ref();
    let digitable_line = details
        .and_then(|d| d.digitable_line.clone())
        .unwrap_or_else(|| barcode.clone());
    let url = details.and_then(|d| d.external_resource_url.clone());

    Ok(IssuedCharge {
        gateway_id: resp.gateway_id(),
        status: PaymentStatus::from_gateway(&resp.status),
        artifacts: Some(PaymentArtifacts::Boleto {
            barcode,
            digitable_line,
            url,
            due_date,
        }),
    })
}

/// PNG do QR em base64.
pub fn render_qr_base64(payload: &str) -> Result<String, AppError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| AppError::PaymentGateway(format!("QR inválido: {}", e)))?;
    let image = code.render::<Luma<u8>>().min_dimensions(256, 256).build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut png, ImageOutputFormat::Png)
        .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

    Ok(STANDARD.encode(png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pix_response_yields_artifacts() {
        let resp: PaymentResponse = serde_json::from_value(json!({
            "id": 1234567890u64,
            "status": "pending",
            "date_of_expiration": "2030-01-01T12:00:00Z",
            "point_of_interaction": {
                "transaction_data": { "qr_code": "00020126580014br.gov.bcb.pix", "qr_code_base64": null }
            }
        }))
        .unwrap();

        let charge = pix_charge(resp).unwrap();
        assert_eq!(charge.gateway_id, "1234567890");
        assert_eq!(charge.status, PaymentStatus::Pending);
        match charge.artifacts {
            Some(PaymentArtifacts::Pix { qr_payload, qr_code_base64, .. }) => {
                assert_eq!(qr_payload, "00020126580014br.gov.bcb.pix");
                // imagem desenhada localmente
                assert!(STANDARD.decode(qr_code_base64).unwrap().starts_with(b"\x89PNG"));
            }
            other => panic!("artefato inesperado: {:?}", other),
        }
    }

    #[test]
    fn pix_without_code_is_a_gateway_error() {
        let resp: PaymentResponse = serde_json::from_value(json!({ "id": "abc", "status": "pending" })).unwrap();
        assert!(matches!(pix_charge(resp), Err(AppError::PaymentGateway(_))));
    }

    #[test]
    fn boleto_response_yields_barcode() {
        let resp: PaymentResponse = serde_json::from_value(json!({
            "id": 42,
            "status": "pending",
            "barcode": { "content": "23791234500000150001234" },
            "transaction_details": {
                "external_resource_url": "https://gateway.test/boleto/42",
                "digitable_line": "23790.12345 60000.015000 12340.000000 1 12345000015000"
            }
        }))
        .unwrap();
        let due = NaiveDate::from_ymd_opt(2030, 5, 10).unwrap();

        let charge = boleto_charge(resp, due).unwrap();
        match charge.artifacts {
            Some(PaymentArtifacts::Boleto { barcode, url, due_date, .. }) => {
                assert_eq!(barcode, "23791234500000150001234");
                assert_eq!(url.as_deref(), Some("https://gateway.test/boleto/42"));
                assert_eq!(due_date, due);
            }
            other => panic!("artefato inesperado: {:?}", other),
        }
    }

    #[test]
    fn payer_identification_kind_follows_length() {
        let payer = Payer {
            name: "Empresa X".into(),
            email: "fin@empresa.com".into(),
            document: Some("11.222.333/0001-81".into()),
        };
        let body = HttpPaymentGateway::payer_body(&payer);
        let id = body.identification.unwrap();
        assert_eq!(id.kind, "CNPJ");
        assert_eq!(id.number, "11222333000181");
    }
}
