//! Time-boxed, single-use password reset.
//!
//! A reset moves an account from no pending reset to a pending one; the
//! pending reset then ends by being consumed, expiring, or being superseded by
//! a newer request. Only the SHA-256 digest of a token is stored.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use crate::auth::account::Account;
use crate::auth::credentials::CredentialStore;
use crate::errors::{Error, Result};
use crate::observability::metrics;

/// Lifetime of a reset token.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

const RESET_TOKEN_BYTES: usize = 32;

/// Hands the raw token to the account holder (email, SMS, ...).
#[async_trait]
pub trait ResetDelivery: Send + Sync {
    async fn deliver(&self, account: &Account, raw_token: &str) -> Result<()>;
}

/// Delivery used until an outbound channel is configured. It records that a
/// reset was issued but never writes the token itself to the logs.
#[derive(Debug, Default, Clone)]
pub struct LoggingResetDelivery;

#[async_trait]
impl ResetDelivery for LoggingResetDelivery {
    async fn deliver(&self, account: &Account, _raw_token: &str) -> Result<()> {
        info!(
            user_id = %account.id,
            has_email = account.email.is_some(),
            "password reset issued; no delivery channel configured"
        );
        Ok(())
    }
}

/// Outcome of a reset request, kept internal so callers can answer uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetRequest {
    /// A token was issued. The raw value is only present when echoing is enabled.
    Issued { echoed_token: Option<String> },
    /// No account has that email.
    UnknownEmail,
    /// The token could not be delivered; any earlier pending reset still stands.
    Undelivered,
}

impl ResetRequest {
    pub fn echoed_token(&self) -> Option<&str> {
        match self {
            ResetRequest::Issued { echoed_token } => echoed_token.as_deref(),
            ResetRequest::UnknownEmail | ResetRequest::Undelivered => None,
        }
    }
}

#[derive(Clone)]
pub struct ResetFlowManager {
    credentials: CredentialStore,
    delivery: Arc<dyn ResetDelivery>,
    echo_token: bool,
}

impl ResetFlowManager {
    pub fn new(credentials: CredentialStore, delivery: Arc<dyn ResetDelivery>) -> Self {
        Self { credentials, delivery, echo_token: false }
    }

    /// Return the raw token to the requester as well. Development only.
    pub fn with_token_echo(mut self, echo: bool) -> Self {
        self.echo_token = echo;
        self
    }

    pub async fn request_reset(&self, email: &str) -> Result<ResetRequest> {
        self.request_reset_at(email, Utc::now()).await
    }

    /// Issue a reset for the account with `email`, superseding any pending one.
    #[instrument(skip(self, email, now))]
    pub async fn request_reset_at(&self, email: &str, now: DateTime<Utc>) -> Result<ResetRequest> {
        if email.trim().is_empty() {
            return Err(Error::validation("Email is required"));
        }

        let Some(account) = self.credentials.find_by_email(email).await? else {
            metrics::record_password_reset("unknown_email");
            return Ok(ResetRequest::UnknownEmail);
        };

        let raw_token = generate_token();
        let expires_at = now + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        // A pending reset is only superseded once the new token has gone out.
        if let Err(e) = self.delivery.deliver(&account, &raw_token).await {
            warn!(user_id = %account.id, error = %e, "password reset delivery failed");
            metrics::record_password_reset("undelivered");
            return Ok(ResetRequest::Undelivered);
        }

        self.credentials
            .store_reset_token(&account.id, &hash_token(&raw_token), expires_at.timestamp_millis())
            .await?;

        metrics::record_password_reset("requested");
        info!(user_id = %account.id, expires_at = %expires_at, "password reset requested");

        Ok(ResetRequest::Issued { echoed_token: self.echo_token.then_some(raw_token) })
    }

    pub async fn consume_reset(&self, raw_token: &str, new_secret: &str) -> Result<Account> {
        self.consume_reset_at(raw_token, new_secret, Utc::now()).await
    }

    /// Set a new secret if `raw_token` names a pending, unexpired reset.
    ///
    /// The write is conditional on the reset still being pending, so of two
    /// concurrent consumers at most one succeeds.
    #[instrument(skip(self, raw_token, new_secret, now))]
    pub async fn consume_reset_at(
        &self,
        raw_token: &str,
        new_secret: &str,
        now: DateTime<Utc>,
    ) -> Result<Account> {
        let token_hash = hash_token(raw_token.trim());
        let now_ms = now.timestamp_millis();

        let Some(account) = self.credentials.find_by_reset_token(&token_hash, now_ms).await? else {
            metrics::record_password_reset("rejected");
            return Err(Error::ResetTokenInvalid);
        };

        let consumed = self
            .credentials
            .set_secret_if_reset_pending(&account.id, &token_hash, new_secret, now_ms)
            .await?;

        if !consumed {
            warn!(user_id = %account.id, "reset token lost a concurrent consumption race");
            metrics::record_password_reset("rejected");
            return Err(Error::ResetTokenInvalid);
        }

        metrics::record_password_reset("consumed");
        info!(user_id = %account.id, "password reset completed");
        Ok(account)
    }
}

/// 32 random bytes from the OS, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hex SHA-256 digest; this is the only form of a token that is persisted.
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
