//! Access gate: turns a bearer header into a live, active account.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::auth::credentials::CredentialStore;
use crate::auth::models::{AuthContext, AuthError};
use crate::auth::token_service::{TokenKind, TokenService};
use crate::domain::UserId;
use crate::observability::metrics;

#[derive(Clone)]
pub struct AccessGate {
    tokens: Arc<TokenService>,
    credentials: CredentialStore,
}

impl AccessGate {
    pub fn new(tokens: Arc<TokenService>, credentials: CredentialStore) -> Self {
        Self { tokens, credentials }
    }

    /// Authenticate an `Authorization` header value.
    ///
    /// The account is re-read on every call so deactivation takes effect on the
    /// next request, not at token expiry.
    #[instrument(skip(self, header), name = "access_gate.authenticate")]
    pub async fn authenticate(&self, header: Option<&str>) -> Result<AuthContext, AuthError> {
        let result = self.admit(header).await;
        match &result {
            Ok(_) => metrics::record_authentication("success"),
            Err(err) => metrics::record_authentication(err.metric_status()),
        }
        result
    }

    /// Resolve a refresh token to an account under the same liveness rules.
    #[instrument(skip(self, token), name = "access_gate.authenticate_refresh")]
    pub async fn authenticate_refresh(&self, token: &str) -> Result<AuthContext, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        let id = self.tokens.verify(token, TokenKind::Refresh).map_err(|e| {
            debug!(error = %e, "refresh token rejected");
            AuthError::TokenFailed
        })?;
        self.load_live_account(&id).await
    }

    async fn admit(&self, header: Option<&str>) -> Result<AuthContext, AuthError> {
        let token = bearer_token(header).ok_or(AuthError::MissingToken)?;

        let id = self.tokens.verify(token, TokenKind::Access).map_err(|e| {
            debug!(error = %e, "access token rejected");
            AuthError::TokenFailed
        })?;

        self.load_live_account(&id).await
    }

    async fn load_live_account(&self, id: &UserId) -> Result<AuthContext, AuthError> {
        let account = self.credentials.find_by_id(id).await?.ok_or(AuthError::AccountNotFound)?;

        if !account.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        Ok(AuthContext::new(account))
    }
}

/// Extract the token from `Bearer <token>`; anything else counts as no token.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
