pub mod admin;
pub mod auth;
pub mod health;

use axum::http::Uri;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::error::ApiError;

pub use admin::{delete_user_handler, toggle_user_handler};
pub use auth::{
    change_password_handler, forgot_password_handler, login_handler, me_handler, refresh_handler,
    register_handler, reset_password_handler, update_profile_handler,
};
pub use health::health_handler;

/// Success envelope carrying only a message.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// Fallback for unmatched routes.
pub async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Route {} not found", uri.path()))
}
