pub mod access_groups;
pub mod auth;
pub mod carriers;
pub mod employees;
pub mod lookup;
pub mod parties;
pub mod payments;
pub mod products;
pub(crate) mod support;
pub mod tenancy;
