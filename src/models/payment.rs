// src/models/payment.rs
//
// Assistente de pagamento (cartão, PIX, boleto) e os pagamentos confirmados.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::documents;
use crate::common::validation::{field_error, validate_cpf_or_cnpj, validate_not_past, validate_positive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Pix,
    Boleto,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Boleto => "boleto",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl PaymentStatus {
    /// Traduz o status devolvido pelo gateway.
    pub fn from_gateway(status: &str) -> Self {
        match status {
            "approved" | "authorized" => PaymentStatus::Approved,
            "rejected" => PaymentStatus::Rejected,
            "cancelled" | "refunded" | "charged_back" => PaymentStatus::Cancelled,
            _ => PaymentStatus::Pending,
        }
    }
}

// Passos do assistente, na ordem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum IntakeStep {
    #[default]
    SelectMethod,
    EnterDetails,
    Confirm,
}

impl IntakeStep {
    pub fn index(&self) -> u8 {
        match self {
            IntakeStep::SelectMethod => 0,
            IntakeStep::EnterDetails => 1,
            IntakeStep::Confirm => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeStep::SelectMethod => "selectMethod",
            IntakeStep::EnterDetails => "enterDetails",
            IntakeStep::Confirm => "confirm",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payer {
    pub name: String,
    pub email: String,
    pub document: Option<String>,
}

/// Dados já validados de cada ramo. Só isto vai para o rascunho: número e CVV do cartão nunca.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaymentDetails {
    #[serde(rename_all = "camelCase")]
    Card {
        holder_name: String,
        payer_email: String,
        card_token: String,
        last_four: String,
        brand: String,
        installments: u8,
    },
    Pix {
        payer: Payer,
    },
    #[serde(rename_all = "camelCase")]
    Boleto {
        payer: Payer,
        #[schema(value_type = String, format = Date)]
        due_date: NaiveDate,
    },
}

impl PaymentDetails {
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentDetails::Card { .. } => PaymentMethod::Card,
            PaymentDetails::Pix { .. } => PaymentMethod::Pix,
            PaymentDetails::Boleto { .. } => PaymentMethod::Boleto,
        }
    }

    pub fn payer(&self) -> Payer {
        match self {
            PaymentDetails::Card { holder_name, payer_email, .. } => Payer {
                name: holder_name.clone(),
                email: payer_email.clone(),
                document: None,
            },
            PaymentDetails::Pix { payer } | PaymentDetails::Boleto { payer, .. } => payer.clone(),
        }
    }
}

/// O que o gateway devolve para exibir ao pagador.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PaymentArtifacts {
    #[serde(rename_all = "camelCase")]
    Pix {
        // "copia e cola"
        qr_payload: String,
        // PNG em base64
        qr_code_base64: String,
        expires_at: Option<DateTime<Utc>>,
    },
    #[serde(rename_all = "camelCase")]
    Boleto {
        barcode: String,
        digitable_line: String,
        url: Option<String>,
        #[schema(value_type = String, format = Date)]
        due_date: NaiveDate,
    },
}

/// Estado do assistente, salvo por tenant + usuário a cada transição.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntake {
    pub step: IntakeStep,
    pub method: Option<PaymentMethod>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub details: Option<PaymentDetails>,
    pub artifacts: Option<PaymentArtifacts>,
    // id da cobrança já emitida (PIX/boleto)
    pub gateway_id: Option<String>,
    // Mesma chave em toda repetição da cobrança deste rascunho
    pub idempotency_key: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub method: PaymentMethod,
    #[schema(example = "150.00")]
    pub amount: Decimal,
    pub description: Option<String>,
    pub status: PaymentStatus,
    pub gateway_id: Option<String>,
    #[schema(value_type = Payer)]
    pub payer: Json<Payer>,
    #[schema(value_type = Option<PaymentArtifacts>)]
    pub artifacts: Option<Json<PaymentArtifacts>>,
    pub created_at: DateTime<Utc>,
}

// ---
// Payloads das transições
// ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SelectMethodPayload {
    pub method: PaymentMethod,
    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "150.00")]
    pub amount: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_card_expiry", skip_on_field_errors = false))]
pub struct CardInput {
    #[validate(length(min = 3, message = "required"))]
    pub holder_name: String,
    #[validate(email(message = "invalid_email"))]
    pub payer_email: String,
    #[validate(custom(function = "validate_card_number"))]
    #[schema(example = "4111 1111 1111 1111")]
    pub number: String,
    #[validate(range(min = 1, max = 12, message = "invalid_expiry"))]
    pub expiry_month: u32,
    pub expiry_year: i32,
    #[validate(custom(function = "validate_cvv"))]
    pub cvv: String,
    #[validate(range(min = 1, max = 12, message = "invalid_installments"))]
    pub installments: u8,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PixInput {
    #[validate(length(min = 3, message = "required"))]
    pub payer_name: String,
    #[validate(email(message = "invalid_email"))]
    pub payer_email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoletoInput {
    #[validate(length(min = 3, message = "required"))]
    pub payer_name: String,
    #[validate(custom(function = "validate_cpf_or_cnpj"))]
    pub payer_document: String,
    #[validate(email(message = "invalid_email"))]
    pub payer_email: String,
    #[validate(custom(function = "validate_not_past"))]
    #[schema(value_type = String, format = Date)]
    pub due_date: NaiveDate,
}

/// Corpo do passo "detalhes": o ramo vem marcado pelo método.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum DetailsPayload {
    Card(CardInput),
    Pix(PixInput),
    Boleto(BoletoInput),
}

impl DetailsPayload {
    pub fn method(&self) -> PaymentMethod {
        match self {
            DetailsPayload::Card(_) => PaymentMethod::Card,
            DetailsPayload::Pix(_) => PaymentMethod::Pix,
            DetailsPayload::Boleto(_) => PaymentMethod::Boleto,
        }
    }

    pub fn validate_branch(&self) -> Result<(), validator::ValidationErrors> {
        match self {
            DetailsPayload::Card(input) => input.validate(),
            DetailsPayload::Pix(input) => input.validate(),
            DetailsPayload::Boleto(input) => input.validate(),
        }
    }
}

fn coded(code: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(code.into());
    err
}

fn validate_card_number(value: &str) -> Result<(), ValidationError> {
    if documents::luhn_valid(value) { Ok(()) } else { Err(coded("invalid_card_number")) }
}

fn validate_cvv(value: &str) -> Result<(), ValidationError> {
    let ok = (3..=4).contains(&value.len()) && value.chars().all(|c| c.is_ascii_digit());
    if ok { Ok(()) } else { Err(coded("invalid_cvv")) }
}

fn validate_card_expiry(input: &CardInput) -> Result<(), ValidationError> {
    let today = Utc::now().date_naive();
    // Aceita ano com 2 dígitos ("28")
    let year = if input.expiry_year < 100 { 2000 + input.expiry_year } else { input.expiry_year };
    let current = (today.year(), today.month());
    if (year, input.expiry_month) < current {
        return Err(field_error("expiryYear", "invalid_expiry"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card() -> CardInput {
        CardInput {
            holder_name: "MARIA DA SILVA".into(),
            payer_email: "maria@cliente.com".into(),
            number: "4111 1111 1111 1111".into(),
            expiry_month: 12,
            expiry_year: Utc::now().year() + 2,
            cvv: "123".into(),
            installments: 3,
        }
    }

    #[test]
    fn valid_card_passes() {
        assert!(card().validate().is_ok());
    }

    #[test]
    fn card_rules() {
        let mut c = card();
        c.number = "4111 1111 1111 1112".into();
        c.cvv = "12".into();
        c.installments = 13;
        c.expiry_year = 2001;
        let errors = c.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("number"));
        assert!(fields.contains_key("cvv"));
        assert!(fields.contains_key("installments"));
        assert!(errors.errors().contains_key("__all__"));
    }

    #[test]
    fn details_payload_is_tagged_by_method() {
        let payload: DetailsPayload = serde_json::from_value(json!({
            "method": "pix",
            "payerName": "Maria da Silva",
            "payerEmail": "maria@cliente.com"
        }))
        .unwrap();
        assert_eq!(payload.method(), PaymentMethod::Pix);
        assert!(payload.validate_branch().is_ok());
    }

    #[test]
    fn boleto_due_date_cannot_be_past() {
        let payload = DetailsPayload::Boleto(BoletoInput {
            payer_name: "Empresa X".into(),
            payer_document: "11.222.333/0001-81".into(),
            payer_email: "fin@empresa.com".into(),
            due_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        });
        let errors = payload.validate_branch().unwrap_err();
        assert!(errors.field_errors().contains_key("due_date"));
    }

    #[test]
    fn gateway_status_mapping() {
        assert_eq!(PaymentStatus::from_gateway("approved"), PaymentStatus::Approved);
        assert_eq!(PaymentStatus::from_gateway("in_process"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_gateway("rejected"), PaymentStatus::Rejected);
    }

    #[test]
    fn step_order() {
        assert!(IntakeStep::SelectMethod < IntakeStep::EnterDetails);
        assert_eq!(IntakeStep::Confirm.index(), 2);
        assert_eq!(PaymentIntake::default().step, IntakeStep::SelectMethod);
    }
}
