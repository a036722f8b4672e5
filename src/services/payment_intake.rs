// src/services/payment_intake.rs
//
// Assistente de pagamento: SelectMethod -> EnterDetails -> Confirm.
// As transições são funções puras sobre `PaymentIntake`; o serviço carrega e grava o rascunho.

use std::sync::Arc;

use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, validation::FieldErrors},
    db::{payment_repo::NewPayment, PaymentRepository},
    models::{
        listing::{ListParams, Page},
        payment::{
            DetailsPayload, IntakeStep, Payer, Payment, PaymentDetails, PaymentIntake, PaymentStatus,
            SelectMethodPayload,
        },
    },
    services::payment_gateway::{CardToken, ChargeRequest, IssuedCharge, PaymentGateway},
};

fn expect_step(state: &PaymentIntake, step: IntakeStep, action: &str) -> Result<(), AppError> {
    if state.step != step {
        return Err(AppError::InvalidTransition(format!(
            "'{}' não é permitido no passo '{}'",
            action,
            state.step.as_str()
        )));
    }
    Ok(())
}

pub fn select_method(state: &PaymentIntake, payload: &SelectMethodPayload) -> Result<PaymentIntake, AppError> {
    expect_step(state, IntakeStep::SelectMethod, "metodo")?;
    payload.validate()?;

    Ok(PaymentIntake {
        step: IntakeStep::EnterDetails,
        method: Some(payload.method),
        amount: Some(payload.amount),
        description: payload.description.clone(),
        idempotency_key: Some(Uuid::new_v4()),
        ..PaymentIntake::default()
    })
}

/// Valida o ramo e fala com o gateway: cartão vira token, PIX e boleto viram cobrança emitida.
pub async fn enter_details(
    state: &PaymentIntake,
    payload: &DetailsPayload,
    gateway: &dyn PaymentGateway,
) -> Result<PaymentIntake, AppError> {
    expect_step(state, IntakeStep::EnterDetails, "detalhes")?;
    let (Some(method), Some(amount)) = (state.method, state.amount) else {
        return Err(AppError::InvalidTransition("rascunho sem método ou valor".to_string()));
    };
    if payload.method() != method {
        let mut errors = FieldErrors::new();
        errors.add("method", "method_mismatch");
        return Err(AppError::FieldValidation(errors));
    }
    payload.validate_branch()?;

    let mut next = state.clone();
    next.step = IntakeStep::Confirm;

    match payload {
        DetailsPayload::Card(input) => {
            let token = gateway.tokenize_card(input).await?;
            next.details = Some(PaymentDetails::Card {
                holder_name: input.holder_name.trim().to_string(),
                payer_email: input.payer_email.trim().to_lowercase(),
                card_token: token.token,
                last_four: token.last_four,
                brand: token.brand,
                installments: input.installments,
            });
            next.artifacts = None;
            next.gateway_id = None;
        }
        DetailsPayload::Pix(input) => {
            let payer = Payer {
                name: input.payer_name.trim().to_string(),
                email: input.payer_email.trim().to_lowercase(),
                document: None,
            };
            let issued = gateway.create_pix(&charge(state, amount, &payer)?).await?;
            next.details = Some(PaymentDetails::Pix { payer });
            apply_issued(&mut next, issued);
        }
        DetailsPayload::Boleto(input) => {
            let payer = Payer {
                name: input.payer_name.trim().to_string(),
                email: input.payer_email.trim().to_lowercase(),
                document: Some(crate::common::documents::only_digits(&input.payer_document)),
            };
            let issued = gateway
                .create_boleto(&charge(state, amount, &payer)?, input.due_date)
                .await?;
            next.details = Some(PaymentDetails::Boleto { payer, due_date: input.due_date });
            apply_issued(&mut next, issued);
        }
    }

    Ok(next)
}

// A chave vem do rascunho: repetir o passo não gera uma segunda cobrança no gateway
fn charge<'a>(
    state: &'a PaymentIntake,
    amount: rust_decimal::Decimal,
    payer: &'a Payer,
) -> Result<ChargeRequest<'a>, AppError> {
    let idempotency_key = state
        .idempotency_key
        .ok_or_else(|| AppError::InvalidTransition("rascunho sem chave de idempotência".to_string()))?;
    Ok(ChargeRequest {
        amount,
        description: state.description.as_deref(),
        payer,
        idempotency_key,
    })
}

fn apply_issued(state: &mut PaymentIntake, issued: IssuedCharge) {
    state.gateway_id = Some(issued.gateway_id);
    state.artifacts = issued.artifacts;
}

/// Um passo para trás. No passo 0 não faz nada.
pub fn back(state: &PaymentIntake) -> PaymentIntake {
    let mut prev = state.clone();
    match state.step {
        IntakeStep::SelectMethod => {}
        IntakeStep::EnterDetails => {
            prev.step = IntakeStep::SelectMethod;
            prev.details = None;
        }
        IntakeStep::Confirm => {
            // A cobrança já emitida expira sozinha no gateway
            prev.step = IntakeStep::EnterDetails;
            prev.details = None;
            prev.artifacts = None;
            prev.gateway_id = None;
            // Os novos dados viram outra cobrança
            prev.idempotency_key = Some(Uuid::new_v4());
        }
    }
    prev
}

pub fn reset() -> PaymentIntake {
    PaymentIntake::default()
}

/// Resultado da confirmação, pronto para gravar.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub status: PaymentStatus,
    pub gateway_id: Option<String>,
}

/// Cartão: cobra com o token. PIX e boleto: a cobrança já foi emitida no passo anterior.
pub async fn confirm(state: &PaymentIntake, gateway: &dyn PaymentGateway) -> Result<Confirmation, AppError> {
    expect_step(state, IntakeStep::Confirm, "confirmar")?;
    let (Some(amount), Some(details)) = (state.amount, state.details.as_ref()) else {
        return Err(AppError::InvalidTransition("rascunho incompleto".to_string()));
    };

    match details {
        PaymentDetails::Card { card_token, last_four, brand, installments, .. } => {
            let payer = details.payer();
            let token = CardToken {
                token: card_token.clone(),
                last_four: last_four.clone(),
                brand: brand.clone(),
            };
            let issued = gateway.charge_card(&charge(state, amount, &payer)?, &token, *installments).await?;
            Ok(Confirmation { status: issued.status, gateway_id: Some(issued.gateway_id) })
        }
        PaymentDetails::Pix { .. } | PaymentDetails::Boleto { .. } => Ok(Confirmation {
            status: PaymentStatus::Pending,
            gateway_id: state.gateway_id.clone(),
        }),
    }
}

// ---
// Serviço: rascunho durável por tenant + usuário
// ---

#[derive(Clone)]
pub struct PaymentService {
    repo: PaymentRepository,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { repo: PaymentRepository::new(), gateway }
    }

    pub async fn current(&self, conn: &mut PgConnection, tenant_id: Uuid, user_id: Uuid) -> Result<PaymentIntake, AppError> {
        Ok(self.repo.load_draft(conn, tenant_id, user_id).await?.unwrap_or_default())
    }

    pub async fn select_method(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user_id: Uuid,
        payload: &SelectMethodPayload,
    ) -> Result<PaymentIntake, AppError> {
        let state = self.current(&mut *conn, tenant_id, user_id).await?;
        let next = select_method(&state, payload)?;
        self.repo.save_draft(conn, tenant_id, user_id, &next).await?;
        Ok(next)
    }

    /// Fala com o gateway sem segurar conexão: o chamador lê o rascunho antes e grava depois.
    pub async fn issue_details(&self, state: &PaymentIntake, payload: &DetailsPayload) -> Result<PaymentIntake, AppError> {
        enter_details(state, payload, self.gateway.as_ref()).await
    }

    /// Grava o passo seguinte se o rascunho não mudou enquanto o gateway respondia.
    pub async fn store_transition(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user_id: Uuid,
        expected: &PaymentIntake,
        next: &PaymentIntake,
    ) -> Result<(), AppError> {
        self.ensure_unchanged(&mut *conn, tenant_id, user_id, expected).await?;
        self.repo.save_draft(conn, tenant_id, user_id, next).await
    }

    pub async fn back(&self, conn: &mut PgConnection, tenant_id: Uuid, user_id: Uuid) -> Result<PaymentIntake, AppError> {
        let state = self.current(&mut *conn, tenant_id, user_id).await?;
        let prev = back(&state);
        self.repo.save_draft(conn, tenant_id, user_id, &prev).await?;
        Ok(prev)
    }

    pub async fn reset(&self, conn: &mut PgConnection, tenant_id: Uuid, user_id: Uuid) -> Result<PaymentIntake, AppError> {
        self.repo.delete_draft(conn, tenant_id, user_id).await?;
        Ok(reset())
    }

    /// Cobra o cartão (ou aproveita a cobrança PIX/boleto já emitida), fora de transação.
    pub async fn charge(&self, state: &PaymentIntake) -> Result<Confirmation, AppError> {
        confirm(state, self.gateway.as_ref()).await
    }

    /// Grava o pagamento e apaga o rascunho; o chamador comita os dois juntos.
    pub async fn record(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user_id: Uuid,
        state: &PaymentIntake,
        outcome: Confirmation,
    ) -> Result<Payment, AppError> {
        self.ensure_unchanged(&mut *conn, tenant_id, user_id, state).await?;

        // confirm() já garantiu método, valor e detalhes
        let (Some(method), Some(amount), Some(details)) = (state.method, state.amount, state.details.as_ref()) else {
            return Err(AppError::InvalidTransition("rascunho incompleto".to_string()));
        };
        let payer = details.payer();

        let payment = self
            .repo
            .insert(
                &mut *conn,
                tenant_id,
                NewPayment {
                    user_id,
                    method,
                    amount,
                    description: state.description.as_deref(),
                    status: outcome.status,
                    gateway_id: outcome.gateway_id.as_deref(),
                    payer: &payer,
                    artifacts: state.artifacts.as_ref(),
                },
            )
            .await?;
        self.repo.delete_draft(conn, tenant_id, user_id).await?;

        tracing::info!("💳 Pagamento {} registrado ({}, {:?})", payment.id, method.as_str(), payment.status);
        Ok(payment)
    }

    async fn ensure_unchanged(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user_id: Uuid,
        expected: &PaymentIntake,
    ) -> Result<(), AppError> {
        let current = self.current(conn, tenant_id, user_id).await?;
        if &current != expected {
            return Err(AppError::InvalidTransition("o rascunho mudou em outra aba".to_string()));
        }
        Ok(())
    }

    pub async fn list(&self, conn: &mut PgConnection, tenant_id: Uuid, params: &ListParams) -> Result<Page<Payment>, AppError> {
        let (rows, total) = self.repo.list(conn, tenant_id, params).await?;
        Ok(Page::new(rows, params, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payment::{BoletoInput, CardInput, PaymentArtifacts, PaymentMethod, PixInput};
    use async_trait::async_trait;
    use chrono::{Datelike, Duration, NaiveDate, Utc};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    struct FakeGateway;

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn tokenize_card(&self, card: &CardInput) -> Result<CardToken, AppError> {
            let digits = crate::common::documents::only_digits(&card.number);
            Ok(CardToken {
                token: "tok_test_123".into(),
                last_four: digits[digits.len() - 4..].to_string(),
                brand: "visa".into(),
            })
        }

        async fn create_pix(&self, _charge: &ChargeRequest<'_>) -> Result<IssuedCharge, AppError> {
            Ok(IssuedCharge {
                gateway_id: "pix-1".into(),
                status: PaymentStatus::Pending,
                artifacts: Some(PaymentArtifacts::Pix {
                    qr_payload: "00020126580014br.gov.bcb.pix".into(),
                    qr_code_base64: "iVBORw0KGgo=".into(),
                    expires_at: None,
                }),
            })
        }

        async fn create_boleto(&self, _charge: &ChargeRequest<'_>, due_date: NaiveDate) -> Result<IssuedCharge, AppError> {
            Ok(IssuedCharge {
                gateway_id: "bol-1".into(),
                status: PaymentStatus::Pending,
                artifacts: Some(PaymentArtifacts::Boleto {
                    barcode: "23791234500000150001234".into(),
                    digitable_line: "23790.12345 60000.015000".into(),
                    url: None,
                    due_date,
                }),
            })
        }

        async fn charge_card(
            &self,
            _charge: &ChargeRequest<'_>,
            card: &CardToken,
            _installments: u8,
        ) -> Result<IssuedCharge, AppError> {
            assert_eq!(card.token, "tok_test_123");
            Ok(IssuedCharge { gateway_id: "card-1".into(), status: PaymentStatus::Approved, artifacts: None })
        }
    }

    // Guarda a chave de idempotência de cada chamada de cobrança
    #[derive(Default)]
    struct RecordingGateway {
        keys: std::sync::Mutex<Vec<Uuid>>,
    }

    impl RecordingGateway {
        fn keys(&self) -> Vec<Uuid> {
            self.keys.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaymentGateway for RecordingGateway {
        async fn tokenize_card(&self, card: &CardInput) -> Result<CardToken, AppError> {
            FakeGateway.tokenize_card(card).await
        }

        async fn create_pix(&self, charge: &ChargeRequest<'_>) -> Result<IssuedCharge, AppError> {
            self.keys.lock().unwrap().push(charge.idempotency_key);
            FakeGateway.create_pix(charge).await
        }

        async fn create_boleto(&self, charge: &ChargeRequest<'_>, due_date: NaiveDate) -> Result<IssuedCharge, AppError> {
            self.keys.lock().unwrap().push(charge.idempotency_key);
            FakeGateway.create_boleto(charge, due_date).await
        }

        async fn charge_card(
            &self,
            charge: &ChargeRequest<'_>,
            card: &CardToken,
            installments: u8,
        ) -> Result<IssuedCharge, AppError> {
            self.keys.lock().unwrap().push(charge.idempotency_key);
            FakeGateway.charge_card(charge, card, installments).await
        }
    }

    fn selected(method: PaymentMethod) -> PaymentIntake {
        select_method(
            &PaymentIntake::default(),
            &SelectMethodPayload {
                method,
                amount: Decimal::from_str("150.00").unwrap(),
                description: Some("Pedido 42".into()),
            },
        )
        .unwrap()
    }

    fn pix_details() -> DetailsPayload {
        DetailsPayload::Pix(PixInput {
            payer_name: "Maria da Silva".into(),
            payer_email: "Maria@Cliente.com".into(),
        })
    }

    fn card_details() -> DetailsPayload {
        DetailsPayload::Card(CardInput {
            holder_name: "MARIA DA SILVA".into(),
            payer_email: "maria@cliente.com".into(),
            number: "4111 1111 1111 1111".into(),
            expiry_month: 12,
            expiry_year: Utc::now().year() + 2,
            cvv: "123".into(),
            installments: 2,
        })
    }

    #[test]
    fn select_method_advances() {
        let state = selected(PaymentMethod::Pix);
        assert_eq!(state.step, IntakeStep::EnterDetails);
        assert_eq!(state.method, Some(PaymentMethod::Pix));
    }

    #[test]
    fn select_method_rejects_non_positive_amount() {
        let result = select_method(
            &PaymentIntake::default(),
            &SelectMethodPayload { method: PaymentMethod::Pix, amount: Decimal::ZERO, description: None },
        );
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn pix_reaches_confirm_with_qr_code() {
        let state = enter_details(&selected(PaymentMethod::Pix), &pix_details(), &FakeGateway).await.unwrap();

        assert_eq!(state.step, IntakeStep::Confirm);
        assert_eq!(state.gateway_id.as_deref(), Some("pix-1"));
        match &state.artifacts {
            Some(PaymentArtifacts::Pix { qr_payload, qr_code_base64, .. }) => {
                assert!(!qr_payload.is_empty());
                assert!(!qr_code_base64.is_empty());
            }
            other => panic!("esperava artefatos PIX, veio {:?}", other),
        }
        assert_eq!(state.details.unwrap().payer().email, "maria@cliente.com");
    }

    #[tokio::test]
    async fn boleto_reaches_confirm_with_barcode() {
        let details = DetailsPayload::Boleto(BoletoInput {
            payer_name: "Empresa X".into(),
            payer_document: "11.222.333/0001-81".into(),
            payer_email: "fin@empresa.com".into(),
            due_date: Utc::now().date_naive() + Duration::days(5),
        });
        let state = enter_details(&selected(PaymentMethod::Boleto), &details, &FakeGateway).await.unwrap();
        assert!(matches!(state.artifacts, Some(PaymentArtifacts::Boleto { .. })));
        assert_eq!(state.details.unwrap().payer().document.as_deref(), Some("11222333000181"));
    }

    #[tokio::test]
    async fn draft_never_holds_card_number_or_cvv() {
        let state = enter_details(&selected(PaymentMethod::Card), &card_details(), &FakeGateway).await.unwrap();
        let json = serde_json::to_string(&state).unwrap();

        assert!(!json.contains("4111111111111111"));
        assert!(!json.contains("4111 1111"));
        assert!(!json.contains("\"cvv\""));
        assert!(json.contains("tok_test_123"));
        assert!(json.contains("\"lastFour\":\"1111\""));
    }

    #[tokio::test]
    async fn details_for_another_method_are_rejected() {
        match enter_details(&selected(PaymentMethod::Boleto), &pix_details(), &FakeGateway).await {
            Err(AppError::FieldValidation(errors)) => assert!(errors.contains("method")),
            other => panic!("esperava erro no campo method, veio {:?}", other),
        }
    }

    #[tokio::test]
    async fn details_before_select_is_invalid() {
        let result = enter_details(&PaymentIntake::default(), &pix_details(), &FakeGateway).await;
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn confirm_only_from_confirm_step() {
        let result = confirm(&selected(PaymentMethod::Pix), &FakeGateway).await;
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn select_method_twice_is_invalid() {
        let state = selected(PaymentMethod::Pix);
        let result = select_method(
            &state,
            &SelectMethodPayload { method: PaymentMethod::Card, amount: Decimal::ONE, description: None },
        );
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn back_discards_artifacts_then_details() {
        let at_confirm = enter_details(&selected(PaymentMethod::Pix), &pix_details(), &FakeGateway).await.unwrap();

        let at_details = back(&at_confirm);
        assert_eq!(at_details.step, IntakeStep::EnterDetails);
        assert!(at_details.artifacts.is_none());
        assert!(at_details.gateway_id.is_none());
        assert_eq!(at_details.method, Some(PaymentMethod::Pix));

        let at_start = back(&at_details);
        assert_eq!(at_start.step, IntakeStep::SelectMethod);
        // no passo 0 não muda nada
        assert_eq!(back(&at_start), at_start);
    }

    #[test]
    fn reset_returns_to_fresh_state() {
        assert_eq!(reset(), PaymentIntake::default());
        assert_eq!(reset().step.index(), 0);
    }

    #[tokio::test]
    async fn card_confirm_charges_with_token() {
        let at_confirm = enter_details(&selected(PaymentMethod::Card), &card_details(), &FakeGateway).await.unwrap();
        let outcome = confirm(&at_confirm, &FakeGateway).await.unwrap();
        assert_eq!(outcome.status, PaymentStatus::Approved);
        assert_eq!(outcome.gateway_id.as_deref(), Some("card-1"));
    }

    #[tokio::test]
    async fn pix_confirm_records_issued_charge() {
        let at_confirm = enter_details(&selected(PaymentMethod::Pix), &pix_details(), &FakeGateway).await.unwrap();
        let outcome = confirm(&at_confirm, &FakeGateway).await.unwrap();
        assert_eq!(outcome.status, PaymentStatus::Pending);
        assert_eq!(outcome.gateway_id.as_deref(), Some("pix-1"));
    }

    #[tokio::test]
    async fn retried_card_confirm_reuses_the_draft_key() {
        let at_confirm = enter_details(&selected(PaymentMethod::Card), &card_details(), &FakeGateway).await.unwrap();
        let gateway = RecordingGateway::default();

        // Falha ao gravar depois da cobrança: o rascunho continua em Confirm e o cliente repete
        confirm(&at_confirm, &gateway).await.unwrap();
        confirm(&at_confirm, &gateway).await.unwrap();

        let keys = gateway.keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], keys[1]);
        assert_eq!(Some(keys[0]), at_confirm.idempotency_key);
    }

    #[tokio::test]
    async fn retried_pix_details_reuse_the_draft_key() {
        let at_details = selected(PaymentMethod::Pix);
        let gateway = RecordingGateway::default();

        enter_details(&at_details, &pix_details(), &gateway).await.unwrap();
        enter_details(&at_details, &pix_details(), &gateway).await.unwrap();

        let keys = gateway.keys();
        assert_eq!(keys, vec![keys[0], keys[0]]);
    }

    #[tokio::test]
    async fn back_from_confirm_issues_a_new_key() {
        let at_confirm = enter_details(&selected(PaymentMethod::Pix), &pix_details(), &FakeGateway).await.unwrap();
        let at_details = back(&at_confirm);

        assert!(at_details.idempotency_key.is_some());
        assert_ne!(at_details.idempotency_key, at_confirm.idempotency_key);
    }

    #[tokio::test]
    async fn charge_without_key_is_refused() {
        let mut at_details = selected(PaymentMethod::Pix);
        at_details.idempotency_key = None;
        let result = enter_details(&at_details, &pix_details(), &FakeGateway).await;
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }
}
