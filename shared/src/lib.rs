//! Shared types and stock reconciliation logic for the warehouse back office
//!
//! This crate has no I/O. It holds the domain models, the response envelope,
//! input validation and the pure functions that turn movement lines into
//! stock positions.

pub mod models;
pub mod stock;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
