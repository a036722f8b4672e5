pub mod access_group_repo;
pub use access_group_repo::AccessGroupRepository;
pub mod carrier_repo;
pub use carrier_repo::CarrierRepository;
pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
pub mod listing;
pub mod party_repo;
pub use party_repo::PartyRepository;
pub mod payment_repo;
pub use payment_repo::PaymentRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod record_ops;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
