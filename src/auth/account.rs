//! Account domain models.
//!
//! [`Account`] is the only shape an identity leaves the store in. It carries no
//! secret hash and no reset state, so anything that serializes an account is
//! redacted by construction. The hash travels separately in
//! [`AccountCredentials`], which is never serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::UserId;

/// Authorization role, fixed when the account is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

/// Error returned when a stored role string is not recognised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// Redacted account record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: UserId,
    pub full_name: String,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub avatar: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Usernames and emails are stored trimmed and lowercased.
    pub fn normalize_identifier(value: &str) -> String {
        value.trim().to_lowercase()
    }
}

/// An account together with its stored secret hash, used only for verification.
#[derive(Clone)]
pub struct AccountCredentials {
    pub account: Account,
    pub password_hash: String,
}

impl std::fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("account", &self.account)
            .field("password_hash", &"***")
            .finish()
    }
}

/// Registration input as received from the client, before normalization.
#[derive(Debug, Clone)]
pub struct Registration {
    pub full_name: String,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: String,
    pub role: Role,
}

impl Registration {
    /// Self-service registration always yields a `user` account.
    pub fn user(
        full_name: impl Into<String>,
        username: impl Into<String>,
        email: Option<String>,
        phone: Option<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            username: username.into(),
            email,
            phone,
            password: password.into(),
            role: Role::User,
        }
    }
}
