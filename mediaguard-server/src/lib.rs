//! MediaGuard Server Library - REST API for content identification
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod config;
pub mod error;
pub mod handlers;
pub mod identity_store;
pub mod multipart;
pub mod openapi;
pub mod routes;
pub mod source;
pub mod state;
pub mod validation;

pub use config::Config;
pub use error::ApiError;
pub use identity_store::{IdentityBackend, PostgresIdentityStore};
pub use openapi::ApiDoc;
pub use routes::{create_router, create_router_with_config};
pub use state::{build_registries, AppState};
