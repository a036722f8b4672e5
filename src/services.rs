pub mod access_group_service;
pub mod address_lookup;
pub mod auth;
pub mod export_service;
pub mod party_service;
pub mod payment_gateway;
pub mod payment_intake;
pub mod registry_service;
pub mod tenancy_service;
