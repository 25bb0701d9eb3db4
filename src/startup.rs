//! Startup sequence for the identity service
//!
//! Seeds the configured administrator on first start and prints a short
//! notice so operators know which login to use.

use tracing::info;

use crate::auth::bootstrap::ensure_admin;
use crate::auth::{Account, CredentialStore, PasswordHasher};
use crate::config::AppConfig;
use crate::errors::Result;
use crate::storage::DbPool;

/// Environment variable to skip seeding the administrator
const ENV_SKIP_ADMIN_SEED: &str = "INCRIME_SKIP_ADMIN_SEED";

fn should_skip_admin_seed() -> bool {
    std::env::var(ENV_SKIP_ADMIN_SEED)
        .map(|v| v.trim().eq_ignore_ascii_case("true") || v.trim() == "1")
        .unwrap_or(false)
}

fn display_admin_banner(account: &Account) {
    let line = "═".repeat(62);
    eprintln!();
    eprintln!("╔{}╗", line);
    eprintln!("║{:^62}║", "INCRIME - ADMINISTRATOR CREATED");
    eprintln!("╠{}╣", line);
    eprintln!("║  {:60}║", format!("Username: {}", account.username));
    eprintln!("║  {:60}║", format!("Email:    {}", account.email.as_deref().unwrap_or("-")));
    eprintln!("║{:62}║", "");
    eprintln!("║  {:60}║", "Sign in with the configured ADMIN_PASSWORD and change it.");
    eprintln!("╚{}╝", line);
    eprintln!();
}

/// Create the administrator account on first start.
///
/// Returns the created account, or `None` when an admin already existed or
/// seeding was disabled through `INCRIME_SKIP_ADMIN_SEED`.
pub async fn seed_admin(pool: &DbPool, config: &AppConfig) -> Result<Option<Account>> {
    if should_skip_admin_seed() {
        info!("Administrator seeding skipped via environment variable");
        return Ok(None);
    }

    let hasher =
        PasswordHasher::new(config.auth.bcrypt_cost).with_timeout(config.auth.hash_timeout());
    let store = CredentialStore::with_sqlx(pool.clone(), hasher);

    let created = ensure_admin(&store, &config.bootstrap).await?;
    if let Some(account) = &created {
        display_admin_banner(account);
    }
    Ok(created)
}
