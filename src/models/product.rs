// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::validation::{digits_with_len, field_error, validate_not_negative};
use crate::models::records::RecordStatus;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,

    #[schema(example = "CAM-001-P")]
    pub sku: String,
    #[schema(example = "7891234567895")]
    pub barcode: Option<String>,
    #[schema(example = "Camiseta Básica P")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "UN")]
    pub unit: String,
    pub brand: Option<String>,
    pub category: Option<String>,

    // Preços
    pub cost_price: Decimal,
    pub margin: Decimal,
    pub sale_price: Decimal,

    // Estoque
    pub stock_quantity: Decimal,
    pub min_stock: Decimal,
    pub max_stock: Option<Decimal>,

    // Fiscal
    #[schema(example = "61091000")]
    pub ncm: Option<String>,
    pub cest: Option<String>,
    #[schema(example = "5102")]
    pub cfop: Option<String>,
    #[schema(example = 0)]
    pub origin: i16,

    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_unit() -> String {
    "UN".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_stock_range", skip_on_field_errors = false))]
pub struct ProductPayload {
    #[validate(length(min = 1, max = 60, message = "required"))]
    #[schema(example = "CAM-001-P")]
    pub sku: String,

    #[validate(custom(function = "validate_barcode"))]
    pub barcode: Option<String>,

    #[validate(length(min = 2, message = "min_length"))]
    #[schema(example = "Camiseta Básica P")]
    pub name: String,
    pub description: Option<String>,

    #[serde(default = "default_unit")]
    #[validate(length(min = 1, max = 6, message = "required"))]
    pub unit: String,
    pub brand: Option<String>,
    pub category: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "25.00")]
    pub cost_price: Decimal,

    // Percentual sobre o custo
    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "60")]
    pub margin: Decimal,

    // Se ausente, calculado a partir de custo + margem
    #[validate(custom(function = "validate_not_negative"))]
    pub sale_price: Option<Decimal>,

    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub stock_quantity: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub min_stock: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub max_stock: Option<Decimal>,

    #[validate(custom(function = "validate_ncm"))]
    pub ncm: Option<String>,
    #[validate(custom(function = "validate_cest"))]
    pub cest: Option<String>,
    #[validate(custom(function = "validate_cfop"))]
    pub cfop: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0, max = 8, message = "invalid_digits"))]
    pub origin: i16,
}

impl ProductPayload {
    /// Preço efetivo: o informado ou custo * (1 + margem/100), em centavos.
    pub fn effective_sale_price(&self) -> Decimal {
        match self.sale_price {
            Some(price) => price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            None => compute_sale_price(self.cost_price, self.margin),
        }
    }
}

pub fn compute_sale_price(cost: Decimal, margin: Decimal) -> Decimal {
    let factor = Decimal::ONE + margin / Decimal::ONE_HUNDRED;
    (cost * factor).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn validate_barcode(value: &str) -> Result<(), ValidationError> {
    // EAN-8, UPC-A, EAN-13, DUN-14
    digits_with_len(value, &[8, 12, 13, 14]).map_err(|_| {
        let mut err = ValidationError::new("invalid_barcode");
        err.message = Some("invalid_barcode".into());
        err
    })
}

fn validate_ncm(value: &str) -> Result<(), ValidationError> {
    digits_with_len(value, &[8])
}

fn validate_cest(value: &str) -> Result<(), ValidationError> {
    digits_with_len(value, &[7])
}

fn validate_cfop(value: &str) -> Result<(), ValidationError> {
    digits_with_len(value, &[4])
}

fn validate_stock_range(payload: &ProductPayload) -> Result<(), ValidationError> {
    if let Some(max) = payload.max_stock {
        if max < payload.min_stock {
            return Err(field_error("maxStock", "max_below_min"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn payload() -> ProductPayload {
        ProductPayload {
            sku: "CAM-001-P".into(),
            barcode: Some("7891234567895".into()),
            name: "Camiseta Básica P".into(),
            description: None,
            unit: "UN".into(),
            brand: None,
            category: Some("Vestuário".into()),
            cost_price: Decimal::from_str("25.00").unwrap(),
            margin: Decimal::from(60),
            sale_price: None,
            stock_quantity: Decimal::from(10),
            min_stock: Decimal::from(2),
            max_stock: Some(Decimal::from(100)),
            ncm: Some("6109.10.00".into()),
            cest: None,
            cfop: Some("5102".into()),
            origin: 0,
        }
    }

    #[test]
    fn sale_price_from_cost_and_margin() {
        assert_eq!(payload().effective_sale_price(), Decimal::from_str("40.00").unwrap());
        assert_eq!(
            compute_sale_price(Decimal::from_str("9.99").unwrap(), Decimal::from_str("33.3").unwrap()),
            Decimal::from_str("13.32").unwrap()
        );
    }

    #[test]
    fn explicit_sale_price_wins() {
        let mut p = payload();
        p.sale_price = Some(Decimal::from_str("39.905").unwrap());
        assert_eq!(p.effective_sale_price(), Decimal::from_str("39.91").unwrap());
    }

    #[test]
    fn valid_product() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn fiscal_codes_and_barcode_are_checked() {
        let mut p = payload();
        p.barcode = Some("12345".into());
        p.cfop = Some("51020".into());
        p.origin = 9;
        let errors = p.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("barcode"));
        assert!(fields.contains_key("cfop"));
        assert!(fields.contains_key("origin"));
    }

    #[test]
    fn max_stock_below_min_is_rejected() {
        let mut p = payload();
        p.max_stock = Some(Decimal::ONE);
        assert!(p.validate().is_err());
    }
}
