//! Administrative account management.

use tracing::{info, instrument};

use crate::auth::account::Account;
use crate::auth::credentials::CredentialStore;
use crate::domain::UserId;
use crate::errors::{Error, Result};

#[derive(Clone)]
pub struct AdminService {
    credentials: CredentialStore,
}

impl AdminService {
    pub fn new(credentials: CredentialStore) -> Self {
        Self { credentials }
    }

    async fn load_non_admin(&self, id: &UserId, refusal: &str) -> Result<Account> {
        let account = self
            .credentials
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("User", id.as_str()))?;

        if account.is_admin() {
            return Err(Error::validation(refusal));
        }

        Ok(account)
    }

    /// Flip a user's active flag. Admin accounts cannot be deactivated.
    #[instrument(skip(self), fields(target_id = %id))]
    pub async fn toggle_active(&self, id: &UserId) -> Result<Account> {
        self.load_non_admin(id, "Cannot deactivate admin").await?;

        let account = self
            .credentials
            .toggle_active(id)
            .await?
            .ok_or_else(|| Error::not_found("User", id.as_str()))?;

        info!(is_active = account.is_active, "account status toggled");
        Ok(account)
    }

    /// Remove a user and everything it owns. Admin accounts cannot be deleted.
    #[instrument(skip(self), fields(target_id = %id))]
    pub async fn delete_account(&self, id: &UserId) -> Result<()> {
        self.load_non_admin(id, "Cannot delete admin").await?;

        if !self.credentials.delete_with_dependents(id).await? {
            return Err(Error::not_found("User", id.as_str()));
        }

        info!("account deleted");
        Ok(())
    }
}
