// src/services/party_service.rs
//
// Clientes e fornecedores: validação por tipo de pessoa (PF / PJ / estrangeiro) e CRUD.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;
use validator::ValidateEmail;

use crate::{
    common::{
        documents::{self, only_digits},
        error::AppError,
        validation::FieldErrors,
    },
    db::PartyRepository,
    models::{
        listing::{ListParams, Page},
        party::{Party, PartyKind, PartyPayload, PartyRecord, PersonType},
        records::{Address, RecordStatus},
    },
};

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn owned(value: &Option<String>) -> Option<String> {
    present(value).map(str::to_string)
}

/// Valida o formulário conforme `personType` e devolve o registro normalizado.
/// Todos os erros são acumulados, cada um no caminho do campo ("addresses.0.zipcode").
pub fn validate_party(payload: &PartyPayload) -> Result<PartyRecord, AppError> {
    let mut errors = FieldErrors::new();

    let person_type = match present(&payload.person_type) {
        None => {
            errors.add("personType", "required");
            None
        }
        Some(token) => {
            let parsed = PersonType::parse(token);
            if parsed.is_none() {
                errors.add("personType", "invalid_person_type");
            }
            parsed
        }
    };

    // --- Campos comuns ---
    let name = present(&payload.name).unwrap_or_default();
    if name.is_empty() {
        errors.add("name", "required");
    } else if name.chars().count() < 3 {
        errors.add("name", "min_length");
    }

    if let Some(email) = present(&payload.email) {
        if !email.validate_email() {
            errors.add("email", "invalid_email");
        }
    }

    let credit_limit = payload.credit_limit.unwrap_or(Decimal::ZERO);
    if credit_limit < Decimal::ZERO {
        errors.add("creditLimit", "not_negative");
    }

    // --- Endereços ---
    // Sem tipo válido, valida como nacional
    let domestic = person_type.map(|t| t.is_domestic()).unwrap_or(true);
    if payload.addresses.is_empty() {
        errors.add("addresses", "min_one");
    }
    let mut addresses = Vec::with_capacity(payload.addresses.len());
    for (i, address) in payload.addresses.iter().enumerate() {
        let prefix = format!("addresses.{}", i);
        errors.check(Some(&prefix), address);
        addresses.push(normalize_address(address, domestic, &prefix, &mut errors));
    }
    // Um principal: o primeiro, se nenhum foi marcado
    if !addresses.is_empty() && !addresses.iter().any(|a| a.is_main) {
        addresses[0].is_main = true;
    }

    for (i, contact) in payload.contacts.iter().enumerate() {
        errors.check(Some(&format!("contacts.{}", i)), contact);
    }

    // --- Ramo do tipo de pessoa ---
    let document = match person_type {
        Some(PersonType::Individual) => validate_individual(payload, &mut errors),
        Some(PersonType::Company) => validate_company(payload, &mut errors),
        Some(PersonType::Foreign) => validate_foreign(payload, &mut errors),
        None => String::new(),
    };

    errors.into_result()?;

    // into_result garante que person_type existe
    let person_type = person_type.ok_or_else(|| anyhow::anyhow!("personType ausente após validação"))?;

    Ok(PartyRecord {
        person_type,
        document,
        name: name.to_string(),
        trade_name: owned(&payload.trade_name),
        rg: match person_type {
            PersonType::Individual => owned(&payload.rg),
            _ => None,
        },
        birth_date: match person_type {
            PersonType::Individual => payload.birth_date,
            _ => None,
        },
        corporate_name: match person_type {
            PersonType::Company => owned(&payload.corporate_name),
            _ => None,
        },
        state_registration: match person_type {
            PersonType::Company => owned(&payload.state_registration),
            _ => None,
        },
        country: match person_type {
            PersonType::Foreign => owned(&payload.country),
            _ => Some("BR".to_string()),
        },
        email: present(&payload.email).map(str::to_lowercase),
        phone: owned(&payload.phone),
        credit_limit,
        notes: owned(&payload.notes),
        addresses,
        contacts: payload.contacts.clone(),
    })
}

fn validate_individual(payload: &PartyPayload, errors: &mut FieldErrors) -> String {
    let cpf = present(&payload.cpf).unwrap_or_default();
    if cpf.is_empty() {
        errors.add("cpf", "required");
    } else if !documents::is_valid_cpf(cpf) {
        errors.add("cpf", "invalid_cpf");
    }

    if present(&payload.rg).is_none() {
        errors.add("rg", "required");
    }

    match payload.birth_date {
        None => errors.add("birthDate", "required"),
        Some(date) if date > Utc::now().date_naive() => errors.add("birthDate", "future_date"),
        Some(_) => {}
    }

    only_digits(cpf)
}

fn validate_company(payload: &PartyPayload, errors: &mut FieldErrors) -> String {
    let cnpj = present(&payload.cnpj).unwrap_or_default();
    if cnpj.is_empty() {
        errors.add("cnpj", "required");
    } else if !documents::is_valid_cnpj(cnpj) {
        errors.add("cnpj", "invalid_cnpj");
    }

    match present(&payload.corporate_name) {
        None => errors.add("corporateName", "required"),
        Some(v) if v.chars().count() < 3 => errors.add("corporateName", "min_length"),
        Some(_) => {}
    }

    only_digits(cnpj)
}

fn validate_foreign(payload: &PartyPayload, errors: &mut FieldErrors) -> String {
    let passport = present(&payload.passport).unwrap_or_default();
    if passport.is_empty() {
        errors.add("passport", "required");
    } else if passport.chars().count() < 5 {
        errors.add("passport", "min_length");
    }

    if present(&payload.country).is_none() {
        errors.add("country", "required");
    }

    passport.to_uppercase()
}

fn normalize_address(address: &Address, domestic: bool, prefix: &str, errors: &mut FieldErrors) -> Address {
    let mut out = address.clone();
    out.state = address.state.trim().to_uppercase();

    if domestic {
        // "required" já foi apontado pelo derive quando vazio
        if !address.zipcode.trim().is_empty() && !documents::is_valid_zipcode(address.zipcode.trim()) {
            errors.add(format!("{}.zipcode", prefix), "invalid_zipcode");
        }
        if !out.state.is_empty() && !documents::is_brazilian_state(&out.state) {
            errors.add(format!("{}.state", prefix), "invalid_state");
        }
        out.zipcode = only_digits(&address.zipcode);
        out.country = Some("BR".to_string());
    } else {
        out.zipcode = address.zipcode.trim().to_string();
    }
    out
}

#[derive(Clone, Copy)]
pub struct PartyService {
    kind: PartyKind,
    repo: PartyRepository,
}

impl PartyService {
    pub fn new(kind: PartyKind) -> Self {
        Self { kind, repo: PartyRepository::new(kind) }
    }

    pub fn kind(&self) -> PartyKind {
        self.kind
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        params: &ListParams,
    ) -> Result<Page<Party>, AppError> {
        let (rows, total) = self.repo.list(conn, tenant_id, params).await?;
        Ok(Page::new(rows, params, total))
    }

    pub async fn export_rows(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        params: &ListParams,
    ) -> Result<Vec<Party>, AppError> {
        self.repo.export(conn, tenant_id, params).await
    }

    pub async fn get(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<Party, AppError> {
        self.repo.get(conn, tenant_id, id).await
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        payload: &PartyPayload,
    ) -> Result<Party, AppError> {
        let record = validate_party(payload)?;
        let party = self.repo.create(conn, tenant_id, &record).await?;
        tracing::info!("📇 {} criado: {}", self.kind.not_found(), party.id);
        Ok(party)
    }

    pub async fn update(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
        payload: &PartyPayload,
    ) -> Result<Party, AppError> {
        let record = validate_party(payload)?;
        self.repo.update(conn, tenant_id, id, &record).await
    }

    pub async fn set_status(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
        status: RecordStatus,
    ) -> Result<(), AppError> {
        self.repo.set_status(conn, tenant_id, id, status).await
    }

    pub async fn bulk_set_status(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        ids: &[Uuid],
        status: RecordStatus,
    ) -> Result<u64, AppError> {
        self.repo.bulk_set_status(conn, tenant_id, ids, status).await
    }

    pub async fn delete(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.repo.delete(conn, tenant_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn address() -> Address {
        Address {
            zipcode: "01310-100".into(),
            street: "Av. Paulista".into(),
            number: "1000".into(),
            city: "São Paulo".into(),
            state: "sp".into(),
            ..Default::default()
        }
    }

    fn pf() -> PartyPayload {
        PartyPayload {
            person_type: Some("PF".into()),
            name: Some("Maria da Silva".into()),
            cpf: Some("529.982.247-25".into()),
            rg: Some("12.345.678-9".into()),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 20),
            addresses: vec![address()],
            ..Default::default()
        }
    }

    fn pj() -> PartyPayload {
        PartyPayload {
            person_type: Some("PJ".into()),
            name: Some("Acme".into()),
            cnpj: Some("11.222.333/0001-81".into()),
            corporate_name: Some("Acme Comércio Ltda".into()),
            addresses: vec![address()],
            ..Default::default()
        }
    }

    fn field_errors(payload: &PartyPayload) -> FieldErrors {
        match validate_party(payload) {
            Err(AppError::FieldValidation(errors)) => errors,
            other => panic!("esperava erro de validação, veio {:?}", other),
        }
    }

    #[test]
    fn pf_without_cpf_is_rejected() {
        let mut payload = pf();
        payload.cpf = None;
        let errors = field_errors(&payload);
        assert_eq!(errors.codes("cpf"), ["required".to_string()]);
    }

    #[test]
    fn valid_pf_is_accepted_and_normalized() {
        let record = validate_party(&pf()).unwrap();
        assert_eq!(record.person_type, PersonType::Individual);
        assert_eq!(record.document, "52998224725");
        assert_eq!(record.addresses[0].zipcode, "01310100");
        assert_eq!(record.addresses[0].state, "SP");
        assert!(record.addresses[0].is_main);
        assert_eq!(record.corporate_name, None);
    }

    #[test]
    fn pj_requires_cnpj_and_corporate_name() {
        let mut payload = pj();
        payload.cnpj = None;
        payload.corporate_name = None;
        let errors = field_errors(&payload);
        assert!(errors.contains("cnpj"));
        assert!(errors.contains("corporateName"));

        let record = validate_party(&pj()).unwrap();
        assert_eq!(record.document, "11222333000181");
        assert_eq!(record.rg, None);
    }

    #[test]
    fn invalid_check_digits_are_reported() {
        let mut payload = pj();
        payload.cnpj = Some("11.222.333/0001-82".into());
        assert_eq!(field_errors(&payload).codes("cnpj"), ["invalid_cnpj".to_string()]);
    }

    #[test]
    fn nested_address_errors_carry_the_index() {
        let mut payload = pf();
        let mut bad = address();
        bad.zipcode = "123".into();
        bad.state = "XX".into();
        payload.addresses.push(bad);
        let errors = field_errors(&payload);
        assert_eq!(errors.codes("addresses.1.zipcode"), ["invalid_zipcode".to_string()]);
        assert!(errors.contains("addresses.1.state"));
        assert!(!errors.contains("addresses.0.zipcode"));
    }

    #[test]
    fn empty_addresses_and_negative_credit() {
        let mut payload = pf();
        payload.addresses.clear();
        payload.credit_limit = Some(Decimal::new(-100, 2));
        let errors = field_errors(&payload);
        assert_eq!(errors.codes("addresses"), ["min_one".to_string()]);
        assert_eq!(errors.codes("creditLimit"), ["not_negative".to_string()]);
    }

    #[test]
    fn missing_or_unknown_person_type() {
        let mut payload = pf();
        payload.person_type = None;
        assert_eq!(field_errors(&payload).codes("personType"), ["required".to_string()]);

        payload.person_type = Some("XYZ".into());
        assert_eq!(field_errors(&payload).codes("personType"), ["invalid_person_type".to_string()]);
    }

    #[test]
    fn foreign_accepts_free_form_postal_code() {
        let mut addr = address();
        addr.zipcode = "SW1A 1AA".into();
        addr.state = "London".into();
        let payload = PartyPayload {
            person_type: Some("estrangeiro".into()),
            name: Some("John Smith".into()),
            passport: Some("gb1234567".into()),
            country: Some("GB".into()),
            addresses: vec![addr],
            ..Default::default()
        };
        let record = validate_party(&payload).unwrap();
        assert_eq!(record.document, "GB1234567");
        assert_eq!(record.addresses[0].zipcode, "SW1A 1AA");
    }

    #[test]
    fn passport_length_counts_characters() {
        let mut payload = PartyPayload {
            person_type: Some("estrangeiro".into()),
            name: Some("Jürgen Müller".into()),
            passport: Some("ÄÖÜ".into()),
            country: Some("DE".into()),
            ..Default::default()
        };
        // 3 letras em 6 bytes
        assert_eq!(field_errors(&payload).codes("passport"), ["min_length".to_string()]);

        payload.passport = Some("ÄÖÜ12".into());
        assert!(!field_errors(&payload).contains("passport"));
    }

    #[test]
    fn short_name_and_bad_contact_email() {
        let mut payload = pf();
        payload.name = Some("Jo".into());
        payload.contacts = vec![crate::models::records::Contact {
            name: "Ana".into(),
            email: Some("nao-e-email".into()),
            ..Default::default()
        }];
        let errors = field_errors(&payload);
        assert_eq!(errors.codes("name"), ["min_length".to_string()]);
        assert_eq!(errors.codes("contacts.0.email"), ["invalid_email".to_string()]);
    }
}
