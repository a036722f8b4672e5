// src/models/party.rs
//
// Clientes e fornecedores: mesma estrutura, tabelas separadas.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::records::{Address, Contact, RecordStatus};

/// Qual cadastro está sendo manipulado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyKind {
    Client,
    Supplier,
}

impl PartyKind {
    pub fn table(&self) -> &'static str {
        match self {
            PartyKind::Client => "clients",
            PartyKind::Supplier => "suppliers",
        }
    }

    /// Nome usado nas rotas e no arquivo exportado.
    pub fn entity(&self) -> &'static str {
        match self {
            PartyKind::Client => "clientes",
            PartyKind::Supplier => "fornecedores",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PartyKind::Client => "Clientes",
            PartyKind::Supplier => "Fornecedores",
        }
    }

    pub fn not_found(&self) -> &'static str {
        match self {
            PartyKind::Client => "cliente",
            PartyKind::Supplier => "fornecedor",
        }
    }
}

// Mapeia o CREATE TYPE person_type do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "person_type")]
pub enum PersonType {
    #[serde(rename = "PF")]
    #[sqlx(rename = "PF")]
    Individual,
    #[serde(rename = "PJ")]
    #[sqlx(rename = "PJ")]
    Company,
    #[serde(rename = "estrangeiro")]
    #[sqlx(rename = "ESTRANGEIRO")]
    Foreign,
}

impl PersonType {
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "pf" => Some(PersonType::Individual),
            "pj" => Some(PersonType::Company),
            "estrangeiro" => Some(PersonType::Foreign),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonType::Individual => "PF",
            PersonType::Company => "PJ",
            PersonType::Foreign => "estrangeiro",
        }
    }

    pub fn is_domestic(&self) -> bool {
        !matches!(self, PersonType::Foreign)
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    pub person_type: PersonType,

    // CPF, CNPJ (só dígitos) ou passaporte
    #[schema(example = "52998224725")]
    pub document: String,

    #[schema(example = "Maria da Silva")]
    pub name: String,
    pub trade_name: Option<String>,

    pub rg: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub birth_date: Option<NaiveDate>,

    pub corporate_name: Option<String>,
    pub state_registration: Option<String>,

    pub country: Option<String>,

    pub email: Option<String>,
    pub phone: Option<String>,

    #[schema(example = "5000.00")]
    pub credit_limit: Decimal,
    pub notes: Option<String>,

    #[schema(value_type = Vec<Address>)]
    pub addresses: Json<Vec<Address>>,
    #[schema(value_type = Vec<Contact>)]
    pub contacts: Json<Vec<Contact>>,

    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Formulário de cliente/fornecedor como chega da UI: todos os campos de todos os tipos.
/// Quais são obrigatórios depende de `personType`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartyPayload {
    #[schema(example = "PF")]
    pub person_type: Option<String>,

    #[schema(example = "Maria da Silva")]
    pub name: Option<String>,
    pub trade_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "5000.00")]
    pub credit_limit: Option<Decimal>,
    pub notes: Option<String>,

    // PF
    #[schema(example = "529.982.247-25")]
    pub cpf: Option<String>,
    pub rg: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "1990-05-20")]
    pub birth_date: Option<NaiveDate>,

    // PJ
    #[schema(example = "11.222.333/0001-81")]
    pub cnpj: Option<String>,
    pub corporate_name: Option<String>,
    pub state_registration: Option<String>,

    // Estrangeiro
    pub passport: Option<String>,
    pub country: Option<String>,

    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

/// Registro já validado e normalizado, pronto para o repositório.
#[derive(Debug, Clone, PartialEq)]
pub struct PartyRecord {
    pub person_type: PersonType,
    pub document: String,
    pub name: String,
    pub trade_name: Option<String>,
    pub rg: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub corporate_name: Option<String>,
    pub state_registration: Option<String>,
    pub country: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub credit_limit: Decimal,
    pub notes: Option<String>,
    pub addresses: Vec<Address>,
    pub contacts: Vec<Contact>,
}
