// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Sistema ---
        handlers::lookup::health,
        handlers::lookup::lookup_cep,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::request_password_reset,
        handlers::auth::confirm_password_reset,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::get_my_tenants,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::list_my_tenants,
        handlers::tenancy::add_member,
        handlers::tenancy::list_members,

        // --- Grupos de acesso ---
        handlers::access_groups::list_permissions,
        handlers::access_groups::list_groups,
        handlers::access_groups::get_group,
        handlers::access_groups::create_group,
        handlers::access_groups::update_group,
        handlers::access_groups::delete_group,

        // --- Clientes ---
        handlers::parties::list_clients,
        handlers::parties::export_clients,
        handlers::parties::get_client,
        handlers::parties::create_client,
        handlers::parties::update_client,
        handlers::parties::set_client_status,
        handlers::parties::bulk_client_status,
        handlers::parties::delete_client,

        // --- Fornecedores ---
        handlers::parties::list_suppliers,
        handlers::parties::export_suppliers,
        handlers::parties::get_supplier,
        handlers::parties::create_supplier,
        handlers::parties::update_supplier,
        handlers::parties::set_supplier_status,
        handlers::parties::bulk_supplier_status,
        handlers::parties::delete_supplier,

        // --- Funcionários ---
        handlers::employees::list_employees,
        handlers::employees::export_employees,
        handlers::employees::get_employee,
        handlers::employees::create_employee,
        handlers::employees::update_employee,
        handlers::employees::set_employee_status,
        handlers::employees::bulk_employee_status,
        handlers::employees::delete_employee,

        // --- Transportadoras ---
        handlers::carriers::list_carriers,
        handlers::carriers::export_carriers,
        handlers::carriers::get_carrier,
        handlers::carriers::create_carrier,
        handlers::carriers::update_carrier,
        handlers::carriers::set_carrier_status,
        handlers::carriers::bulk_carrier_status,
        handlers::carriers::delete_carrier,

        // --- Produtos ---
        handlers::products::list_products,
        handlers::products::export_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::set_product_status,
        handlers::products::bulk_product_status,
        handlers::products::delete_product,

        // --- Pagamentos ---
        handlers::payments::get_intake,
        handlers::payments::select_method,
        handlers::payments::enter_details,
        handlers::payments::back,
        handlers::payments::reset,
        handlers::payments::confirm,
        handlers::payments::list_payments,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::ResetPasswordRequestPayload,
            models::auth::ResetPasswordConfirmPayload,
            models::auth::AuthResponse,
            models::auth::MessageResponse,
            models::auth::ResetRequestedResponse,

            // --- Tenancy ---
            models::tenancy::Tenant,
            models::tenancy::TenantMember,
            models::tenancy::MemberView,
            models::tenancy::CreateTenantPayload,
            models::tenancy::AddMemberPayload,

            // --- Grupos de acesso ---
            models::access_group::AccessGroup,
            models::access_group::AccessGroupPayload,
            models::access_group::PermissionInfo,

            // --- Cadastros ---
            models::records::RecordStatus,
            models::records::Address,
            models::records::Contact,
            models::records::StatusPayload,
            models::records::BulkStatusPayload,
            models::records::BulkStatusResponse,
            models::party::PersonType,
            models::party::Party,
            models::party::PartyPayload,
            models::employee::Employee,
            models::employee::EmployeePayload,
            models::carrier::Carrier,
            models::carrier::CarrierPayload,
            models::product::Product,
            models::product::ProductPayload,

            // --- Listagens ---
            models::listing::SortDirection,
            models::listing::ExportFormat,
            models::listing::Pagination,

            // --- Pagamentos ---
            models::payment::PaymentMethod,
            models::payment::PaymentStatus,
            models::payment::IntakeStep,
            models::payment::Payer,
            models::payment::PaymentDetails,
            models::payment::PaymentArtifacts,
            models::payment::PaymentIntake,
            models::payment::Payment,
            models::payment::SelectMethodPayload,
            models::payment::CardInput,
            models::payment::PixInput,
            models::payment::BoletoInput,
            models::payment::DetailsPayload,

            // --- Endereço ---
            services::address_lookup::PostalAddress,
        )
    ),
    tags(
        (name = "Sistema", description = "Saúde do servidor"),
        (name = "Auth", description = "Autenticação, registro e redefinição de senha"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Tenancy", description = "Gestão de empresas e equipe"),
        (name = "Grupos de acesso", description = "Permissões por grupo"),
        (name = "Clientes", description = "Cadastro de clientes (PF, PJ, estrangeiro)"),
        (name = "Fornecedores", description = "Cadastro de fornecedores (PF, PJ, estrangeiro)"),
        (name = "Funcionários", description = "Cadastro de funcionários"),
        (name = "Transportadoras", description = "Cadastro de transportadoras"),
        (name = "Produtos", description = "Cadastro de produtos"),
        (name = "Pagamentos", description = "Assistente de pagamento (cartão, PIX, boleto)"),
        (name = "Endereço", description = "Consulta de CEP")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_registry_and_payment_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/api/clientes", "/api/fornecedores/exportar", "/produtos/{id}", "/api/pagamentos/intake/confirmar"] {
            assert!(doc.paths.paths.contains_key(path), "faltando {path}");
        }
    }
}
