//! Seeding of the initial administrator.

use tracing::{info, instrument};

use crate::auth::account::{Account, Registration, Role};
use crate::auth::credentials::CredentialStore;
use crate::config::BootstrapConfig;
use crate::errors::Result;

/// Create the configured administrator unless an admin already exists.
///
/// Returns the new account, or `None` when nothing had to be done.
#[instrument(skip(store, config), fields(username = %config.admin_username))]
pub async fn ensure_admin(store: &CredentialStore, config: &BootstrapConfig) -> Result<Option<Account>> {
    if store.admin_exists().await? {
        info!("admin account already present");
        return Ok(None);
    }

    let account = store
        .create(Registration {
            full_name: config.admin_full_name.clone(),
            username: config.admin_username.clone(),
            email: Some(config.admin_email.clone()),
            phone: None,
            password: config.admin_password.clone(),
            role: Role::Admin,
        })
        .await?;

    info!(user_id = %account.id, "admin account created");
    Ok(Some(account))
}
