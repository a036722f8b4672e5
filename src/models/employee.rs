// src/models/employee.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::validation::{field_error, validate_cpf, validate_not_future, validate_not_negative};
use crate::models::records::{Address, RecordStatus};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "João Pereira")]
    pub name: String,
    #[schema(example = "52998224725")]
    pub cpf: String,
    pub rg: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "Vendedor")]
    pub position: String,
    pub department: Option<String>,
    #[schema(example = "3500.00")]
    pub salary: Decimal,
    #[schema(value_type = String, format = Date)]
    pub hire_date: NaiveDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub termination_date: Option<NaiveDate>,
    #[schema(value_type = Option<Address>)]
    pub address: Option<Json<Address>>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_employment_dates", skip_on_field_errors = false))]
pub struct EmployeePayload {
    #[validate(length(min = 3, message = "min_length"))]
    #[schema(example = "João Pereira")]
    pub name: String,

    #[validate(custom(function = "validate_cpf"))]
    #[schema(example = "529.982.247-25")]
    pub cpf: String,

    pub rg: Option<String>,

    #[validate(custom(function = "validate_not_future"))]
    #[schema(value_type = Option<String>, format = Date, example = "1990-05-20")]
    pub birth_date: Option<NaiveDate>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,

    #[validate(length(min = 2, message = "required"))]
    #[schema(example = "Vendedor")]
    pub position: String,
    pub department: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    #[schema(example = "3500.00")]
    pub salary: Decimal,

    #[schema(value_type = String, format = Date, example = "2024-02-01")]
    pub hire_date: NaiveDate,

    #[schema(value_type = Option<String>, format = Date)]
    pub termination_date: Option<NaiveDate>,

    #[validate(nested)]
    pub address: Option<Address>,
}

fn validate_employment_dates(payload: &EmployeePayload) -> Result<(), ValidationError> {
    if let Some(end) = payload.termination_date {
        if end < payload.hire_date {
            return Err(field_error("terminationDate", "before_hire_date"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> EmployeePayload {
        EmployeePayload {
            name: "João Pereira".into(),
            cpf: "529.982.247-25".into(),
            rg: None,
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 20),
            email: Some("joao@empresa.com.br".into()),
            phone: None,
            position: "Vendedor".into(),
            department: None,
            salary: Decimal::new(350000, 2),
            hire_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            termination_date: None,
            address: None,
        }
    }

    #[test]
    fn valid_employee() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn termination_before_hire_is_rejected() {
        let mut p = payload();
        p.termination_date = NaiveDate::from_ymd_opt(2023, 1, 1);
        let errors = p.validate().unwrap_err();
        let flat = crate::common::validation::FieldErrors::from_validator(&errors);
        assert_eq!(flat.codes("terminationDate"), ["before_hire_date".to_string()]);
    }

    #[test]
    fn invalid_cpf_and_negative_salary() {
        let mut p = payload();
        p.cpf = "123.456.789-00".into();
        p.salary = Decimal::new(-1, 0);
        let errors = p.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("cpf"));
        assert!(fields.contains_key("salary"));
    }
}
