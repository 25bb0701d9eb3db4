//! Signed access and refresh tokens.
//!
//! Both kinds are HS256 JWTs carrying `{sub, iat, exp}`. They are signed with
//! different secrets, so a refresh token never verifies as an access token and
//! the reverse. Expiry is checked here against an explicit clock rather than by
//! `jsonwebtoken`, which keeps expiry testable without sleeping.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::UserId;
use crate::errors::{Error, Result};
use crate::observability::metrics;

pub const ACCESS_TOKEN_TTL_DAYS: i64 = 7;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }

    pub fn lifetime(&self) -> Duration {
        match self {
            TokenKind::Access => Duration::days(ACCESS_TOKEN_TTL_DAYS),
            TokenKind::Refresh => Duration::days(REFRESH_TOKEN_TTL_DAYS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Why a presented token was not accepted. Callers never get partial claims.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is invalid")]
    Invalid,
    #[error("token has expired")]
    Expired,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build from the two signing secrets, which must be non-empty and distinct.
    pub fn new(access_secret: &str, refresh_secret: &str) -> Result<Self> {
        if access_secret.is_empty() || refresh_secret.is_empty() {
            return Err(Error::config("Token signing secrets must not be empty"));
        }
        if access_secret == refresh_secret {
            return Err(Error::config("Access and refresh signing secrets must differ"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Ok(Self {
            access: SigningKeys::from_secret(access_secret),
            refresh: SigningKeys::from_secret(refresh_secret),
            validation,
        })
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn issue_access(&self, account_id: &UserId) -> Result<String> {
        self.issue_at(TokenKind::Access, account_id, Utc::now())
    }

    pub fn issue_refresh(&self, account_id: &UserId) -> Result<String> {
        self.issue_at(TokenKind::Refresh, account_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, kind: TokenKind, account_id: &UserId, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: (now + kind.lifetime()).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys(kind).encoding)
            .map_err(|e| Error::internal(format!("Failed to sign {} token: {}", kind.as_str(), e)))?;

        metrics::record_token_issued(kind.as_str());
        Ok(token)
    }

    pub fn verify(&self, token: &str, kind: TokenKind) -> std::result::Result<UserId, TokenError> {
        self.verify_at(token, kind, Utc::now())
    }

    /// Verify signature, shape and expiry against `now`.
    ///
    /// A token stops being valid at the instant `exp` is reached.
    pub fn verify_at(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> std::result::Result<UserId, TokenError> {
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation).map_err(
            |e| {
                debug!(kind = kind.as_str(), error = %e, "token rejected");
                TokenError::Invalid
            },
        )?;

        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        if data.claims.sub.is_empty() {
            return Err(TokenError::Invalid);
        }

        Ok(UserId::from_string(data.claims.sub))
    }
}
