//! # REST API
//!
//! JSON endpoints for the identity service. Every response, success or
//! failure, is an envelope with a `success` flag and an optional `message`.

pub mod docs;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{build_router, ApiState};
pub use server::start_api_server;
