//! Registration, login and token refresh.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::auth::account::{Account, Registration};
use crate::auth::credentials::CredentialStore;
use crate::auth::gate::AccessGate;
use crate::auth::models::AuthError;
use crate::auth::token_service::TokenService;
use crate::errors::{AuthErrorType, Error, Result};
use crate::observability::metrics;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const ACCOUNT_DEACTIVATED: &str = "Your account has been deactivated. Contact support.";

/// An authenticated account together with a freshly minted token pair.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub account: Account,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct LoginService {
    credentials: CredentialStore,
    tokens: Arc<TokenService>,
    gate: Arc<AccessGate>,
}

impl LoginService {
    pub fn new(credentials: CredentialStore, tokens: Arc<TokenService>, gate: Arc<AccessGate>) -> Self {
        Self { credentials, tokens, gate }
    }

    /// Create a `user` account and sign it in.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> Result<AuthSession> {
        let account = self.credentials.create(registration).await?;
        self.session_for(account)
    }

    /// Authenticate by username or email.
    ///
    /// Unknown identifiers and wrong secrets fail identically. An inactive
    /// account is only reported as such once the secret has been proven.
    #[instrument(skip(self, identifier, password))]
    pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthSession> {
        if identifier.trim().is_empty() || password.is_empty() {
            return Err(Error::validation("Username and password are required"));
        }

        let Some(credentials) = self.credentials.find_by_login_identifier(identifier).await? else {
            self.credentials.verify_unknown(password).await;
            warn!("login attempt for unknown identifier");
            metrics::record_authentication("invalid_credentials");
            return Err(Error::auth(INVALID_CREDENTIALS, AuthErrorType::InvalidCredentials));
        };

        if !self.credentials.verify_secret(&credentials, password).await? {
            warn!(user_id = %credentials.account.id, "login attempt with incorrect password");
            metrics::record_authentication("invalid_credentials");
            return Err(Error::auth(INVALID_CREDENTIALS, AuthErrorType::InvalidCredentials));
        }

        let mut account = credentials.account;
        if !account.is_active {
            warn!(user_id = %account.id, "login attempt for deactivated account");
            metrics::record_authentication("inactive");
            return Err(Error::auth(ACCOUNT_DEACTIVATED, AuthErrorType::AccountDeactivated));
        }

        let now = Utc::now();
        self.credentials.mark_login(&account.id, now).await?;
        account.last_login_at = Some(now);

        metrics::record_authentication("success");
        info!(user_id = %account.id, "user logged in successfully");

        self.session_for(account)
    }

    /// Mint a new access token from a refresh token for a live, active account.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> std::result::Result<String, AuthError> {
        let context = self.gate.authenticate_refresh(refresh_token).await?;
        self.tokens.issue_access(context.user_id()).map_err(AuthError::from)
    }

    fn session_for(&self, account: Account) -> Result<AuthSession> {
        let access_token = self.tokens.issue_access(&account.id)?;
        let refresh_token = self.tokens.issue_refresh(&account.id)?;
        Ok(AuthSession { account, access_token, refresh_token })
    }
}
