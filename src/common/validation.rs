// src/common/validation.rs

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::common::{documents, error::AppError, i18n::I18nStore};

/// Erros por caminho de campo ("name", "addresses.0.zipcode"), cada um com seus códigos.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<String>, code: impl Into<String>) {
        self.0.entry(path.into()).or_default().push(code.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn codes(&self, path: &str) -> &[String] {
        self.0.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn from_validator(errors: &ValidationErrors) -> Self {
        let mut out = Self::new();
        out.absorb(None, errors);
        out
    }

    /// Copia os erros do `validator` sob o prefixo dado, achatando structs e listas aninhadas.
    pub fn absorb(&mut self, prefix: Option<&str>, errors: &ValidationErrors) {
        for (field, kind) in errors.errors() {
            let name = to_camel_case(&field.to_string());
            let path = match prefix {
                Some(p) => format!("{}.{}", p, name),
                None => name,
            };
            match kind {
                ValidationErrorsKind::Field(list) => {
                    for err in list {
                        let code = err
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| err.code.to_string());
                        // Erro de schema pode apontar o campo no parâmetro "field"
                        let target = err
                            .params
                            .get("field")
                            .and_then(|v| v.as_str())
                            .map(|f| match prefix {
                                Some(p) => format!("{}.{}", p, f),
                                None => f.to_string(),
                            });
                        self.add(target.unwrap_or_else(|| path.clone()), code);
                    }
                }
                ValidationErrorsKind::Struct(inner) => self.absorb(Some(&path), inner),
                ValidationErrorsKind::List(items) => {
                    for (index, inner) in items {
                        self.absorb(Some(&format!("{}.{}", path, index)), inner);
                    }
                }
            }
        }
    }

    /// Valida `item` e junta os erros sob `prefix`.
    pub fn check<T: validator::Validate>(&mut self, prefix: Option<&str>, item: &T) {
        if let Err(errors) = item.validate() {
            self.absorb(prefix, &errors);
        }
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::FieldValidation(self))
        }
    }

    /// Traduz os códigos para o corpo da resposta: { "campo": ["mensagem", ...] }.
    pub fn to_json(&self, lang: &str, i18n: &I18nStore) -> Value {
        let map: serde_json::Map<String, Value> = self
            .0
            .iter()
            .map(|(path, codes)| {
                let messages = codes
                    .iter()
                    .map(|code| Value::String(i18n.translate(lang, &format!("fields.{}", code))))
                    .collect();
                (path.clone(), Value::Array(messages))
            })
            .collect();
        Value::Object(map)
    }
}

pub fn to_camel_case(field: &str) -> String {
    // "__all__" (erros de schema) passa intacto
    if field.starts_with("__") {
        return field.to_string();
    }
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn error(code: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(code.into());
    err
}

/// Erro de validação de schema atribuído a um campo específico.
pub fn field_error(field: &'static str, code: &'static str) -> ValidationError {
    let mut err = error(code);
    err.add_param("field".into(), &field);
    err
}

// ---
// Validadores customizados para o `#[validate(custom(...))]`
// ---

pub fn validate_cpf(value: &str) -> Result<(), ValidationError> {
    if documents::is_valid_cpf(value) { Ok(()) } else { Err(error("invalid_cpf")) }
}

pub fn validate_cpf_or_cnpj(value: &str) -> Result<(), ValidationError> {
    if documents::is_valid_cpf_or_cnpj(value) { Ok(()) } else { Err(error("invalid_document")) }
}

pub fn validate_not_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(error("not_negative"));
    }
    Ok(())
}

pub fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(error("must_be_positive"));
    }
    Ok(())
}

pub fn validate_not_future(value: &NaiveDate) -> Result<(), ValidationError> {
    if *value > Utc::now().date_naive() {
        return Err(error("future_date"));
    }
    Ok(())
}

pub fn validate_not_past(value: &NaiveDate) -> Result<(), ValidationError> {
    if *value < Utc::now().date_naive() {
        return Err(error("past_date"));
    }
    Ok(())
}

pub fn validate_plate(value: &str) -> Result<(), ValidationError> {
    if documents::is_valid_plate(value) { Ok(()) } else { Err(error("invalid_plate")) }
}

/// Sequência de dígitos com um dos tamanhos aceitos (NCM=8, CEST=7, CFOP=4...).
pub fn digits_with_len(value: &str, lens: &[usize]) -> Result<(), ValidationError> {
    let digits = documents::only_digits(value);
    if digits.len() == value.trim().replace('.', "").len() && lens.contains(&digits.len()) {
        Ok(())
    } else {
        Err(error("invalid_digits"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Inner {
        #[validate(length(min = 8, message = "invalid_zipcode"))]
        zip_code: String,
    }

    #[derive(Validate)]
    struct Outer {
        #[validate(length(min = 3, message = "min_length"))]
        full_name: String,
        #[validate(nested)]
        items: Vec<Inner>,
    }

    #[test]
    fn camel_case_conversion() {
        assert_eq!(to_camel_case("birth_date"), "birthDate");
        assert_eq!(to_camel_case("name"), "name");
        assert_eq!(to_camel_case("state_registration_id"), "stateRegistrationId");
    }

    #[test]
    fn flattens_nested_lists_with_indices() {
        let outer = Outer {
            full_name: "Jo".into(),
            items: vec![
                Inner { zip_code: "01310100".into() },
                Inner { zip_code: "123".into() },
            ],
        };
        let errors = outer.validate().unwrap_err();
        let flat = FieldErrors::from_validator(&errors);

        assert_eq!(flat.codes("fullName"), ["min_length".to_string()]);
        assert_eq!(flat.codes("items.1.zipCode"), ["invalid_zipcode".to_string()]);
        assert!(!flat.contains("items.0.zipCode"));
    }

    #[test]
    fn prefix_is_applied() {
        let mut flat = FieldErrors::new();
        flat.check(Some("addresses.2"), &Inner { zip_code: "1".into() });
        assert!(flat.contains("addresses.2.zipCode"));
    }

    #[derive(Validate)]
    #[validate(schema(function = "check_range"))]
    struct Range {
        start: u32,
        end_at: u32,
    }

    fn check_range(r: &Range) -> Result<(), ValidationError> {
        if r.end_at < r.start {
            return Err(field_error("endAt", "before_start"));
        }
        Ok(())
    }

    #[test]
    fn schema_errors_land_on_the_named_field() {
        let errors = Range { start: 5, end_at: 1 }.validate().unwrap_err();
        let flat = FieldErrors::from_validator(&errors);
        assert_eq!(flat.codes("endAt"), ["before_start".to_string()]);
        assert!(!flat.contains("__all__"));
    }

    #[test]
    fn empty_errors_are_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
        let mut flat = FieldErrors::new();
        flat.add("name", "required");
        assert!(matches!(flat.into_result(), Err(AppError::FieldValidation(_))));
    }

    #[test]
    fn digit_fields() {
        assert!(digits_with_len("22030010", &[8]).is_ok());
        assert!(digits_with_len("2203.00.10", &[8]).is_ok());
        assert!(digits_with_len("5102", &[4]).is_ok());
        assert!(digits_with_len("51A2", &[4]).is_err());
        assert!(digits_with_len("510", &[4]).is_err());
    }

    #[test]
    fn negative_decimal_rejected() {
        assert!(validate_not_negative(&Decimal::new(-1, 2)).is_err());
        assert!(validate_not_negative(&Decimal::ZERO).is_ok());
        assert!(validate_positive(&Decimal::ZERO).is_err());
    }
}
