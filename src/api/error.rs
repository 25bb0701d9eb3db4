use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::models::AuthError;
use crate::errors::Error;

const GENERIC_SERVER_ERROR: &str = "Server error";

/// HTTP-facing error. Every variant renders as `{ "success": false, "message": ... }`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    /// Detail has already been logged; the message is safe to show.
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn forbidden<S: Into<String>>(msg: S) -> Self {
        ApiError::Forbidden(msg.into())
    }

    /// Replace the generic message of an internal error with a route-specific one.
    pub fn or_internal(self, message: &str) -> Self {
        match self {
            ApiError::Internal(_) => ApiError::Internal(message.to_string()),
            other => other,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

/// Failure envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody { success: false, message: self.message().to_string() };
        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(msg) | Error::Conflict(msg) => ApiError::BadRequest(msg),
            Error::ResetTokenInvalid => ApiError::BadRequest(err.to_string()),
            Error::Auth { message, .. } => ApiError::Unauthorized(message),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::NotFound { .. } => ApiError::NotFound(err.to_string()),
            Error::Database { .. }
            | Error::Timeout { .. }
            | Error::Config(_)
            | Error::Transport(_)
            | Error::Io(_)
            | Error::Internal(_) => {
                tracing::error!(error = %err, source = ?std::error::Error::source(&err), "request failed");
                ApiError::Internal(GENERIC_SERVER_ERROR.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken
            | AuthError::TokenFailed
            | AuthError::AccountNotFound
            | AuthError::AccountDeactivated => ApiError::Unauthorized(err.to_string()),
            AuthError::Forbidden => ApiError::Forbidden(err.to_string()),
            AuthError::Persistence(inner) => ApiError::from(inner),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected request body");
        ApiError::BadRequest("Invalid JSON request body".to_string())
    }
}
