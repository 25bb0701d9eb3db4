//! Request-scoped authentication state and the access gate's failure modes.

use thiserror::Error;

use crate::auth::account::{Account, Role};
use crate::domain::UserId;
use crate::errors::Error;

/// Attached to request extensions once the access gate admits a request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account: Account,
}

impl AuthContext {
    pub fn new(account: Account) -> Self {
        Self { account }
    }

    pub fn user_id(&self) -> &UserId {
        &self.account.id
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.account.role == role
    }
}

/// Reasons the access gate refuses a request. Display strings are the
/// messages returned to clients.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authorized, no token")]
    MissingToken,
    #[error("Not authorized, token failed")]
    TokenFailed,
    #[error("User not found")]
    AccountNotFound,
    #[error("Account is deactivated")]
    AccountDeactivated,
    #[error("Access denied: Admins only")]
    Forbidden,
    #[error(transparent)]
    Persistence(#[from] Error),
}

impl AuthError {
    /// Label used for the `auth_authentications_total` counter.
    pub fn metric_status(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::TokenFailed => "invalid_token",
            AuthError::AccountNotFound => "not_found",
            AuthError::AccountDeactivated => "inactive",
            AuthError::Forbidden => "forbidden",
            AuthError::Persistence(_) => "error",
        }
    }
}
