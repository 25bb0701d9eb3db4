//! # Database Migration Management
//!
//! SQL migrations under `migrations/` are embedded into the binary at compile
//! time and applied on startup when `auto_migrate` is enabled, or explicitly via
//! the `migrate` subcommand.

use crate::errors::Result;
use crate::storage::DbPool;
use sqlx::migrate::Migrator;
use tracing::{error, info};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run all pending database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    info!(available = MIGRATOR.iter().count(), "Starting database migration process");

    MIGRATOR.run(pool).await.map_err(|e| {
        error!(error = %e, "Database migration failed");
        e
    })?;

    info!(version = ?latest_version(), "Database migrations completed");
    Ok(())
}

/// Highest migration version embedded in this build
pub fn latest_version() -> Option<i64> {
    MIGRATOR.iter().map(|m| m.version).max()
}

/// Every migration version embedded in this build, ascending
pub fn known_versions() -> Vec<i64> {
    MIGRATOR.iter().map(|m| m.version).collect()
}

/// Versions already recorded as applied in the target database
///
/// A database that has never been migrated has no bookkeeping table yet and
/// reports nothing applied.
pub async fn applied_versions(pool: &DbPool) -> Result<Vec<i64>> {
    let tracked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;
    if tracked == 0 {
        return Ok(Vec::new());
    }

    let versions = sqlx::query_scalar::<_, i64>(
        "SELECT version FROM _sqlx_migrations WHERE success = 1 ORDER BY version",
    )
    .fetch_all(pool)
    .await?;

    Ok(versions)
}
