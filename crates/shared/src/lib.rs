//! Keystone Shared Types and Utilities
//!
//! This crate contains the domain types and error taxonomy shared across the
//! Keystone platform.

pub mod db;
pub mod error;
pub mod types;

pub use db::*;
pub use error::*;
pub use types::*;
