//! Keystone API Library
//!
//! This crate contains the API server components for Keystone: the token
//! codec, credential orchestration, authentication/authorization middleware,
//! persistence stores, and the HTTP routes that expose them.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
