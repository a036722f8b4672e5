// src/app.rs

use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::auth::{auth_guard, tenant_guard},
};

/// Monta todas as rotas sobre o estado já pronto.
pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/api/health", get(handlers::lookup::health))
        .route("/api/auth/registrar", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/reset-password/request", post(handlers::auth::request_password_reset))
        .route("/api/auth/reset-password/confirm", post(handlers::auth::confirm_password_reset));

    // Só exigem o token
    let user_routes = Router::new()
        .route("/api/users/me", get(handlers::auth::get_me))
        .route("/api/users/me/tenants", get(handlers::auth::get_my_tenants))
        .route(
            "/api/tenants",
            post(handlers::tenancy::create_tenant).get(handlers::tenancy::list_my_tenants),
        )
        .route("/api/permissions", get(handlers::access_groups::list_permissions))
        .route("/api/cep/{cep}", get(handlers::lookup::lookup_cep))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Token + x-tenant-id. A última camada roda primeiro: auth antes do tenant.
    let tenant_routes = Router::new()
        .route(
            "/api/tenants/members",
            post(handlers::tenancy::add_member).get(handlers::tenancy::list_members),
        )
        .route(
            "/api/grupos-acesso",
            get(handlers::access_groups::list_groups).post(handlers::access_groups::create_group),
        )
        .route(
            "/api/grupos-acesso/{id}",
            get(handlers::access_groups::get_group)
                .put(handlers::access_groups::update_group)
                .delete(handlers::access_groups::delete_group),
        )
        .merge(client_routes())
        .merge(supplier_routes())
        .merge(employee_routes())
        .merge(carrier_routes())
        .merge(product_routes())
        .merge(payment_routes())
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(tenant_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

fn client_routes() -> Router<AppState> {
    use handlers::parties::*;
    Router::new()
        .route("/api/clientes", get(list_clients).post(create_client))
        .route("/api/clientes/exportar", get(export_clients))
        .route("/api/clientes/status", patch(bulk_client_status))
        .route("/api/clientes/{id}", get(get_client).put(update_client).delete(delete_client))
        .route("/api/clientes/{id}/status", patch(set_client_status))
}

fn supplier_routes() -> Router<AppState> {
    use handlers::parties::*;
    Router::new()
        .route("/api/fornecedores", get(list_suppliers).post(create_supplier))
        .route("/api/fornecedores/exportar", get(export_suppliers))
        .route("/api/fornecedores/status", patch(bulk_supplier_status))
        .route("/api/fornecedores/{id}", get(get_supplier).put(update_supplier).delete(delete_supplier))
        .route("/api/fornecedores/{id}/status", patch(set_supplier_status))
}

fn employee_routes() -> Router<AppState> {
    use handlers::employees::*;
    Router::new()
        .route("/api/funcionarios", get(list_employees).post(create_employee))
        .route("/api/funcionarios/exportar", get(export_employees))
        .route("/api/funcionarios/status", patch(bulk_employee_status))
        .route("/api/funcionarios/{id}", get(get_employee).put(update_employee).delete(delete_employee))
        .route("/api/funcionarios/{id}/status", patch(set_employee_status))
}

fn carrier_routes() -> Router<AppState> {
    use handlers::carriers::*;
    Router::new()
        .route("/api/transportadoras", get(list_carriers).post(create_carrier))
        .route("/api/transportadoras/exportar", get(export_carriers))
        .route("/api/transportadoras/status", patch(bulk_carrier_status))
        .route("/api/transportadoras/{id}", get(get_carrier).put(update_carrier).delete(delete_carrier))
        .route("/api/transportadoras/{id}/status", patch(set_carrier_status))
}

// Produtos ficam fora do prefixo /api
fn product_routes() -> Router<AppState> {
    use handlers::products::*;
    Router::new()
        .route("/produtos", get(list_products).post(create_product))
        .route("/produtos/exportar", get(export_products))
        .route("/produtos/status", patch(bulk_product_status))
        .route("/produtos/{id}", get(get_product).put(update_product).delete(delete_product))
        .route("/produtos/{id}/status", patch(set_product_status))
}

fn payment_routes() -> Router<AppState> {
    use handlers::payments::*;
    Router::new()
        .route("/api/pagamentos", get(list_payments))
        .route("/api/pagamentos/intake", get(get_intake).delete(reset))
        .route("/api/pagamentos/intake/metodo", post(select_method))
        .route("/api/pagamentos/intake/detalhes", post(enter_details))
        .route("/api/pagamentos/intake/voltar", post(back))
        .route("/api/pagamentos/intake/confirmar", post(confirm))
}
