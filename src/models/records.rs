// src/models/records.rs
//
// Peças compartilhadas pelos cadastros: situação, endereço e contato.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Mapeia o CREATE TYPE record_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "record_status", rename_all = "lowercase")]
pub enum RecordStatus {
    #[serde(rename = "ativo")]
    #[sqlx(rename = "ativo")]
    Active,
    #[serde(rename = "inativo")]
    #[sqlx(rename = "inativo")]
    Inactive,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "ativo",
            RecordStatus::Inactive => "inativo",
        }
    }
}

// Endereço embutido no registro (JSONB). Campos ausentes viram "" e caem no "required".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    #[schema(example = "01310-100")]
    #[validate(length(min = 1, message = "required"))]
    pub zipcode: String,

    #[schema(example = "Av. Paulista")]
    #[validate(length(min = 2, message = "required"))]
    pub street: String,

    #[schema(example = "1000")]
    #[validate(length(min = 1, message = "required"))]
    pub number: String,

    pub complement: Option<String>,

    #[schema(example = "Bela Vista")]
    pub district: Option<String>,

    #[schema(example = "São Paulo")]
    #[validate(length(min = 2, message = "required"))]
    pub city: String,

    #[schema(example = "SP")]
    #[validate(length(min = 1, message = "required"))]
    pub state: String,

    #[schema(example = "BR")]
    pub country: Option<String>,

    pub is_main: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    #[schema(example = "Ana Souza")]
    #[validate(length(min = 2, message = "required"))]
    pub name: String,

    #[schema(example = "Financeiro")]
    pub role: Option<String>,

    #[schema(example = "ana@empresa.com.br")]
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    #[schema(example = "(11) 98888-7777")]
    pub phone: Option<String>,
}

// PATCH /{id}/status
#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusPayload {
    #[schema(example = "inativo")]
    pub status: RecordStatus,
}

// PATCH /status (em lote)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkStatusPayload {
    #[validate(length(min = 1, message = "min_one"))]
    pub ids: Vec<Uuid>,
    pub status: RecordStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusResponse {
    pub updated: u64,
    pub status: RecordStatus,
}
