// tests/db_test.rs
//
// Fluxos completos contra Postgres. O `sqlx::test` cria um banco novo por teste
// (DATABASE_URL aponta para um usuário que pode criar bancos) e roda as migrações.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use sqlx::{PgPool, Postgres, Transaction};
use tower::ServiceExt;
use uuid::Uuid;

use erp_backend::{
    app::build_router,
    common::error::AppError,
    config::{AppState, Config},
    models::payment::PaymentIntake,
};

/// Roteador de um tenant recém-criado, com token do dono.
struct Session {
    state: AppState,
    router: Router,
    token: String,
    user_id: Uuid,
    tenant_id: String,
}

impl Session {
    async fn open(pool: PgPool) -> Self {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://sqlx-test".to_string()),
            "JWT_SECRET" => Some("segredo-de-teste".to_string()),
            _ => None,
        })
        .unwrap();
        let state = AppState::build(pool, config);
        let router = build_router(state.clone());

        let response = send(
            &router,
            Method::POST,
            "/api/auth/registrar",
            &[],
            Some(json!({ "name": "Dona da Loja", "email": "dona@loja.com.br", "password": "senha123" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let auth = body_json(response).await;
        let token = auth["token"].as_str().unwrap().to_string();
        let user_id = auth["user"]["id"].as_str().unwrap().parse().unwrap();

        let bearer = format!("Bearer {}", token);
        let response = send(
            &router,
            Method::POST,
            "/api/tenants",
            &[(header::AUTHORIZATION.as_str(), bearer.as_str())],
            Some(json!({ "name": "Loja Centro" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let tenant_id = body_json(response).await["id"].as_str().unwrap().to_string();

        Self { state, router, token, user_id, tenant_id }
    }

    fn tenant_uuid(&self) -> Uuid {
        self.tenant_id.parse().unwrap()
    }

    /// Transação com as variáveis de RLS, como a dos handlers.
    async fn tenant_tx(&self) -> Transaction<'static, Postgres> {
        let mut tx = self.state.db_pool.begin().await.unwrap();
        for (key, value) in [("app.tenant_id", self.tenant_id.clone()), ("app.user_id", self.user_id.to_string())] {
            sqlx::query("SELECT set_config($1, $2, true)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await
                .unwrap();
        }
        tx
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let bearer = format!("Bearer {}", self.token);
        send(
            &self.router,
            method,
            uri,
            &[(header::AUTHORIZATION.as_str(), bearer.as_str()), ("x-tenant-id", self.tenant_id.as_str())],
            body,
        )
        .await
    }

    async fn create_product(&self, sku: &str) -> String {
        let response = self
            .call(Method::POST, "/produtos", Some(json!({ "sku": sku, "name": format!("Produto {}", sku) })))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_str().unwrap().to_string()
    }

    async fn product_status(&self, id: &str) -> Value {
        let response = self.call(Method::GET, &format!("/produtos/{}", id), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["status"].clone()
    }
}

async fn send(router: &Router, method: Method, uri: &str, headers: &[(&str, &str)], body: Option<Value>) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    router.clone().oneshot(request.body(body).unwrap()).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn deactivated_record_stays_listed_as_inactive(pool: PgPool) {
    let session = Session::open(pool).await;
    let id = session.create_product("CAM-001").await;
    session.create_product("CAM-002").await;

    let response = session
        .call(Method::PATCH, &format!("/produtos/{}/status", id), Some(json!({ "status": "inativo" })))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = session.call(Method::GET, "/produtos?status=inativo", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    let data = page["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], id.as_str());
    assert_eq!(data[0]["status"], "inativo");

    // desativar não apaga
    let all = body_json(session.call(Method::GET, "/produtos", None).await).await;
    assert_eq!(all["pagination"]["total"], 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn second_page_holds_at_most_the_limit(pool: PgPool) {
    let session = Session::open(pool).await;
    for i in 0..13 {
        session.create_product(&format!("SKU-{:02}", i)).await;
    }

    let response = session.call(Method::GET, "/produtos?pagina=2&limite=10&ordenarPor=sku&ordem=ascend", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;

    let data = page["data"].as_array().unwrap();
    assert!(data.len() <= 10);
    assert_eq!(data.len(), 3);
    assert_eq!(data[0]["sku"], "SKU-10");
    assert_eq!(page["pagination"]["page"], 2);
    assert_eq!(page["pagination"]["limit"], 10);
    assert_eq!(page["pagination"]["total"], 13);
    assert_eq!(page["pagination"]["totalPages"], 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn bulk_status_with_a_foreign_id_changes_nothing(pool: PgPool) {
    let session = Session::open(pool).await;
    let first = session.create_product("CAM-001").await;
    let second = session.create_product("CAM-002").await;

    let response = session
        .call(
            Method::PATCH,
            "/produtos/status",
            Some(json!({ "ids": [first, second, Uuid::new_v4()], "status": "inativo" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(session.product_status(&first).await, "ativo");
    assert_eq!(session.product_status(&second).await, "ativo");

    let response = session
        .call(Method::PATCH, "/produtos/status", Some(json!({ "ids": [first, second], "status": "inativo" })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["updated"], 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn empty_export_is_refused_without_a_file(pool: PgPool) {
    let session = Session::open(pool).await;

    let response = session.call(Method::GET, "/produtos/exportar?formato=xlsx", None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(body_json(response).await["error"], "Nenhum registro para exportar.");
}

#[sqlx::test(migrations = "./migrations")]
async fn bad_listing_parameters_are_bad_requests(pool: PgPool) {
    let session = Session::open(pool).await;
    session.create_product("CAM-001").await;

    let response = session.call(Method::GET, "/produtos/exportar?formato=docx", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["details"]["formato"].is_array());

    let response = session.call(Method::GET, "/api/clientes?createdFrom=ontem", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["details"]["createdFrom"].is_array());
}

#[sqlx::test(migrations = "./migrations")]
async fn draft_changed_during_the_gateway_call_is_not_overwritten(pool: PgPool) {
    let session = Session::open(pool).await;

    let response = session
        .call(Method::POST, "/api/pagamentos/intake/metodo", Some(json!({ "method": "pix", "amount": 150.0 })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let selected: PaymentIntake = serde_json::from_value(body_json(response).await).unwrap();
    assert!(selected.idempotency_key.is_some());

    // outra aba descarta o rascunho enquanto o gateway responde
    let response = session.call(Method::DELETE, "/api/pagamentos/intake", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let service = &session.state.payment_service;
    let mut tx = session.tenant_tx().await;
    let result = service
        .store_transition(&mut tx, session.tenant_uuid(), session.user_id, &selected, &PaymentIntake::default())
        .await;
    assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    drop(tx);

    let mut tx = session.tenant_tx().await;
    service
        .store_transition(&mut tx, session.tenant_uuid(), session.user_id, &PaymentIntake::default(), &selected)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let current = body_json(session.call(Method::GET, "/api/pagamentos/intake", None).await).await;
    assert_eq!(current["idempotencyKey"], selected.idempotency_key.unwrap().to_string());
}
