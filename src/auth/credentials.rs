//! Credential store: the only component that reads or writes account secrets.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use validator::ValidateEmail;

use crate::auth::account::{Account, AccountCredentials, Registration, Role};
use crate::auth::hashing::{validate_password, PasswordHasher};
use crate::domain::UserId;
use crate::errors::{Error, Result};
use crate::observability::metrics;
use crate::storage::repositories::{
    AccountRepository, NewAccount, ProfileUpdate, SqlxAccountRepository,
};
use crate::storage::DbPool;

pub const USERNAME_TAKEN: &str = "Username already taken";
pub const EMAIL_TAKEN: &str = "Email already registered";

/// Requested profile changes. Blank values are ignored.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct CredentialStore {
    repository: Arc<dyn AccountRepository>,
    hasher: PasswordHasher,
}

impl CredentialStore {
    pub fn new(repository: Arc<dyn AccountRepository>, hasher: PasswordHasher) -> Self {
        Self { repository, hasher }
    }

    pub fn with_sqlx(pool: DbPool, hasher: PasswordHasher) -> Self {
        Self::new(Arc::new(SqlxAccountRepository::new(pool)), hasher)
    }

    /// Account matching a username or an email, with its secret hash.
    pub async fn find_by_login_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<AccountCredentials>> {
        let identifier = Account::normalize_identifier(identifier);
        if identifier.is_empty() {
            return Ok(None);
        }
        self.repository.find_credentials_by_identifier(&identifier).await
    }

    pub async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>> {
        self.repository.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let email = Account::normalize_identifier(email);
        if email.is_empty() {
            return Ok(None);
        }
        self.repository.find_by_email(&email).await
    }

    pub async fn find_credentials_by_id(&self, id: &UserId) -> Result<Option<AccountCredentials>> {
        self.repository.find_credentials_by_id(id).await
    }

    /// Validate, normalize and persist a new account. Only the hash is stored.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn create(&self, registration: Registration) -> Result<Account> {
        let full_name = registration.full_name.trim().to_string();
        let username = Account::normalize_identifier(&registration.username);
        let email = non_blank(registration.email).map(|e| Account::normalize_identifier(&e));
        let phone = non_blank(registration.phone);

        if full_name.is_empty() || username.is_empty() || registration.password.is_empty() {
            return Err(Error::validation("Full name, username, and password are required"));
        }

        if email.is_none() && phone.is_none() && registration.role == Role::User {
            return Err(Error::validation("Email or phone number is required"));
        }

        if let Some(email) = &email {
            ensure_valid_email(email)?;
        }

        validate_password(&registration.password)?;

        if self.repository.username_exists(&username).await? {
            return Err(Error::conflict(USERNAME_TAKEN));
        }

        if let Some(email) = &email {
            if self.repository.email_taken(email, None).await? {
                return Err(Error::conflict(EMAIL_TAKEN));
            }
        }

        let password_hash = self.hasher.hash(&registration.password).await?;

        let account = self
            .repository
            .create(NewAccount {
                id: UserId::new(),
                full_name,
                username,
                email,
                phone,
                password_hash,
                role: registration.role,
            })
            .await
            .map_err(conflict_from_unique_violation)?;

        metrics::record_registration();
        info!(user_id = %account.id, role = %account.role, "account created");
        Ok(account)
    }

    /// Compare a candidate secret with the stored hash.
    pub async fn verify_secret(
        &self,
        credentials: &AccountCredentials,
        candidate: &str,
    ) -> Result<bool> {
        self.hasher.verify(candidate, &credentials.password_hash).await
    }

    /// Burn a verification's worth of time for a login that matched no account.
    pub async fn verify_unknown(&self, candidate: &str) {
        self.hasher.verify_dummy(candidate).await;
    }

    async fn hash_secret(&self, new_secret: &str) -> Result<String> {
        validate_password(new_secret)?;
        self.hasher.hash(new_secret).await
    }

    /// Replace an account's secret unconditionally.
    ///
    /// Secret changes go through this method or through
    /// [`set_secret_if_reset_pending`](Self::set_secret_if_reset_pending).
    #[instrument(skip(self, new_secret), fields(user_id = %id))]
    pub async fn set_secret(&self, id: &UserId, new_secret: &str) -> Result<()> {
        let password_hash = self.hash_secret(new_secret).await?;
        self.repository.update_password_hash(id, &password_hash).await?;
        info!("account secret changed");
        Ok(())
    }

    /// Replace the secret only while the reset named by `token_hash` is still
    /// pending and unexpired, clearing it in the same write.
    ///
    /// Returns `false` when the reset was consumed, superseded or expired first.
    #[instrument(skip(self, token_hash, new_secret), fields(user_id = %id))]
    pub async fn set_secret_if_reset_pending(
        &self,
        id: &UserId,
        token_hash: &str,
        new_secret: &str,
        now_ms: i64,
    ) -> Result<bool> {
        let password_hash = self.hash_secret(new_secret).await?;
        let consumed =
            self.repository.consume_reset_token(id, token_hash, &password_hash, now_ms).await?;
        if consumed {
            info!("account secret changed through reset");
        }
        Ok(consumed)
    }

    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn toggle_active(&self, id: &UserId) -> Result<Option<Account>> {
        self.repository.toggle_active(id).await
    }

    pub async fn mark_login(&self, id: &UserId, when: DateTime<Utc>) -> Result<()> {
        self.repository.mark_login(id, when).await
    }

    /// Apply profile changes, keeping emails normalized and unique.
    #[instrument(skip(self, changes), fields(user_id = %id))]
    pub async fn update_profile(&self, id: &UserId, changes: ProfileChanges) -> Result<Account> {
        let email = non_blank(changes.email).map(|e| Account::normalize_identifier(&e));

        if let Some(email) = &email {
            ensure_valid_email(email)?;
            if self.repository.email_taken(email, Some(id)).await? {
                return Err(Error::conflict(EMAIL_TAKEN));
            }
        }

        let update = ProfileUpdate {
            full_name: non_blank(changes.full_name),
            email,
            phone: non_blank(changes.phone),
        };

        self.repository.update_profile(id, update).await.map_err(conflict_from_unique_violation)
    }

    pub async fn delete_with_dependents(&self, id: &UserId) -> Result<bool> {
        self.repository.delete_with_dependents(id).await
    }

    pub async fn admin_exists(&self) -> Result<bool> {
        self.repository.admin_exists().await
    }

    pub(crate) async fn store_reset_token(
        &self,
        id: &UserId,
        token_hash: &str,
        expires_at_ms: i64,
    ) -> Result<()> {
        self.repository.store_reset_token(id, token_hash, expires_at_ms).await
    }

    pub(crate) async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now_ms: i64,
    ) -> Result<Option<Account>> {
        self.repository.find_by_reset_token(token_hash, now_ms).await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn ensure_valid_email(email: &str) -> Result<()> {
    if email.validate_email() {
        Ok(())
    } else {
        Err(Error::validation("Please provide a valid email address"))
    }
}

/// A concurrent insert can pass the existence checks and still hit the unique index.
fn conflict_from_unique_violation(err: Error) -> Error {
    if !err.is_unique_violation() {
        return err;
    }

    let on_email = match &err {
        Error::Database { source, .. } => source
            .as_database_error()
            .map(|db| db.message().contains("accounts.email"))
            .unwrap_or(false),
        _ => false,
    };

    warn!(on_email, "uniqueness race detected on account write");
    Error::conflict(if on_email { EMAIL_TAKEN } else { USERNAME_TAKEN })
}
