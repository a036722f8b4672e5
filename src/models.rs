pub mod access_group;
pub mod auth;
pub mod carrier;
pub mod employee;
pub mod listing;
pub mod party;
pub mod payment;
pub mod product;
pub mod records;
pub mod tenancy;
