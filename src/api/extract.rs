//! Request extractors that fail with the JSON error envelope.

use axum::extract::FromRequest;

use crate::api::error::ApiError;

/// `axum::Json` whose rejection is an [`ApiError`] instead of a plain-text body.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
