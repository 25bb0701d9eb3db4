//! # Error Handling
//!
//! Domain error types for the identity service. HTTP mapping lives in
//! [`crate::api::error`].

pub mod types;

pub use types::{AuthErrorType, Error, Result};
