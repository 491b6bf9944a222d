// Library exports for the admin binary and integration tests

pub mod asset_store;
pub mod company;
pub mod config;
pub mod context;
pub mod domain;
pub mod export;
pub mod import;
pub mod listing;
pub mod record;
pub mod record_store;
pub mod upload;
pub mod validation;

pub use context::BackOffice;
