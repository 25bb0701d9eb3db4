//! Self-service account operations for an authenticated caller.

use tracing::{info, instrument};

use crate::auth::account::Account;
use crate::auth::credentials::{CredentialStore, ProfileChanges};
use crate::domain::UserId;
use crate::errors::{Error, Result};

#[derive(Clone)]
pub struct AccountService {
    credentials: CredentialStore,
}

impl AccountService {
    pub fn new(credentials: CredentialStore) -> Self {
        Self { credentials }
    }

    #[instrument(skip(self, changes), fields(user_id = %id))]
    pub async fn update_profile(&self, id: &UserId, changes: ProfileChanges) -> Result<Account> {
        let account = self.credentials.update_profile(id, changes).await?;
        info!("profile updated");
        Ok(account)
    }

    /// Change the caller's secret after proving the current one.
    #[instrument(skip(self, current, new_secret), fields(user_id = %id))]
    pub async fn change_password(&self, id: &UserId, current: &str, new_secret: &str) -> Result<()> {
        if current.is_empty() || new_secret.is_empty() {
            return Err(Error::validation("Current password and new password are required"));
        }

        let credentials = self
            .credentials
            .find_credentials_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("User", id.as_str()))?;

        if !self.credentials.verify_secret(&credentials, current).await? {
            return Err(Error::validation("Current password is incorrect"));
        }

        self.credentials.set_secret(id, new_secret).await
    }
}
