//! Axum middleware for authentication and role checks.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Method, Request},
    middleware::Next,
    response::Response,
};
use tracing::{field, info_span, warn, Instrument};

use crate::api::error::ApiError;
use crate::auth::account::Role;
use crate::auth::gate::AccessGate;
use crate::auth::models::{AuthContext, AuthError};
use crate::observability::metrics;

pub type AccessGateState = Arc<AccessGate>;

/// Admit requests that carry a valid access token for a live, active account.
///
/// On success the [`AuthContext`] is inserted into the request extensions,
/// where handlers and [`require_role`] pick it up.
pub async fn authenticate(
    State(gate): State<AccessGateState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let correlation_id = uuid::Uuid::new_v4();
    let span = info_span!(
        "auth_middleware.authenticate",
        http.method = %request.method(),
        http.path = %request.uri().path(),
        auth.user_id = field::Empty,
        correlation_id = %correlation_id
    );

    let header = request.headers().get(AUTHORIZATION).and_then(|value| value.to_str().ok());

    match gate.authenticate(header).instrument(span.clone()).await {
        Ok(context) => {
            span.record("auth.user_id", field::display(context.user_id()));
            request.extensions_mut().insert(context);
            Ok(next.run(request).instrument(span).await)
        }
        Err(err) => {
            warn!(parent: &span, %correlation_id, error = %err, "authentication failed");
            Err(ApiError::from(err))
        }
    }
}

/// Reject callers whose account role differs from the one this layer was built with.
///
/// Must run after [`authenticate`]; a request that reaches it without an
/// [`AuthContext`] is treated as unauthenticated.
pub async fn require_role(
    State(required): State<Role>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(context) = request.extensions().get::<AuthContext>() else {
        return Err(ApiError::from(AuthError::MissingToken));
    };

    if context.has_role(required) {
        return Ok(next.run(request).await);
    }

    warn!(
        user_id = %context.user_id(),
        role = %context.account.role,
        required = %required,
        path = %request.uri().path(),
        "role check failed"
    );
    metrics::record_authentication("forbidden");
    Err(ApiError::from(AuthError::Forbidden))
}
