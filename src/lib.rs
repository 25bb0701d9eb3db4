//! # InCrime Identity Service
//!
//! Account registration, credential verification, bearer-token issuance and
//! the password reset flow for the InCrime legal platform.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌─────────────────┐
//! │  REST API   │    │ Auth Services│    │ Credential Store│
//! │   (Axum)    │───▶│  gate/login  │───▶│    (SQLx)       │
//! │             │    │  reset/admin │    │                 │
//! └─────────────┘    └──────────────┘    └─────────────────┘
//! ```

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod startup;
pub mod storage;

pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "incrime";
