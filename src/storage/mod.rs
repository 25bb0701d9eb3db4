//! # Storage and Persistence
//!
//! SQLite connectivity, embedded migrations and the account repository.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use crate::config::DatabaseConfig;

pub use migrations::run_migrations;
pub use pool::{create_pool, DbPool};
pub use repositories::{AccountRepository, NewAccount, ProfileUpdate, SqlxAccountRepository};

use crate::errors::{Error, Result};

/// Check database connectivity
pub async fn check_connection(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| Error::database(e, "Database connectivity check failed"))?;

    Ok(())
}
