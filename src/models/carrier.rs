// src/models/carrier.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_cpf_or_cnpj, validate_plate};
use crate::models::records::{Address, RecordStatus};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Carrier {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Rápido Transportes Ltda")]
    pub name: String,
    #[schema(example = "11222333000181")]
    pub document: String,
    pub state_registration: Option<String>,
    pub rntrc: Option<String>,
    #[schema(example = "ABC1D23")]
    pub vehicle_plate: Option<String>,
    #[schema(example = "Truck")]
    pub vehicle_type: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(value_type = Option<Address>)]
    pub address: Option<Json<Address>>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarrierPayload {
    #[validate(length(min = 3, message = "min_length"))]
    pub name: String,

    // CPF (autônomo) ou CNPJ
    #[validate(custom(function = "validate_cpf_or_cnpj"))]
    #[schema(example = "11.222.333/0001-81")]
    pub document: String,

    pub state_registration: Option<String>,
    pub rntrc: Option<String>,

    #[validate(custom(function = "validate_plate"))]
    pub vehicle_plate: Option<String>,
    pub vehicle_type: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,

    #[validate(nested)]
    pub address: Option<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plate_and_document_are_checked() {
        let payload = CarrierPayload {
            name: "Rápido Transportes".into(),
            document: "11.222.333/0001-81".into(),
            state_registration: None,
            rntrc: None,
            vehicle_plate: Some("ABC-1234".into()),
            vehicle_type: Some("Truck".into()),
            email: None,
            phone: None,
            address: None,
        };
        assert!(payload.validate().is_ok());

        let bad = CarrierPayload {
            document: "123".into(),
            vehicle_plate: Some("12-ABC".into()),
            ..payload
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("document"));
        assert!(errors.field_errors().contains_key("vehicle_plate"));
    }
}
