//! Storefront module: product catalog, per-user carts that reserve stock,
//! and orders with a small status lifecycle.

// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::{client, error, model};

pub mod errors;

// === MODULE WIRING ===
pub mod module;
pub use module::{StorageOptions, Storefront};

// === INTERNAL MODULES ===
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;

pub use config::StorefrontConfig;
