//! # Database Connection Pool Management
//!
//! Creates the SQLite pool shared by every repository.

use crate::config::DatabaseConfig;
use crate::errors::{Error, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::{str::FromStr, time::Duration};

/// Type alias for the database connection pool
pub type DbPool = Pool<Sqlite>;

const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a database connection pool with the specified configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    validate_config(config)?;

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout())
        .idle_timeout(config.idle_timeout());

    let mut connect_options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| {
            Error::database(
                e,
                format!("Invalid SQLite connection string: {}", sanitize_url(&config.url)),
            )
        })?
        .busy_timeout(SQLITE_BUSY_TIMEOUT)
        .foreign_keys(true);

    if config.is_in_memory() {
        // Dropping the only connection would drop the database with it.
        pool_options = pool_options.max_lifetime(None);
    } else {
        connect_options =
            connect_options.create_if_missing(true).journal_mode(SqliteJournalMode::Wal);
    }

    let pool = pool_options.connect_with(connect_options).await.map_err(|e| {
        tracing::error!(
            error = %e,
            url = %sanitize_url(&config.url),
            busy_timeout_ms = SQLITE_BUSY_TIMEOUT.as_millis(),
            "Failed to create SQLite database pool"
        );
        Error::database(e, format!("Failed to connect to database: {}", sanitize_url(&config.url)))
    })?;

    tracing::info!(
        in_memory = config.is_in_memory(),
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        connect_timeout_ms = config.connect_timeout().as_millis(),
        idle_timeout_ms = config.idle_timeout().map(|d| d.as_millis()),
        "Database connection pool created"
    );

    if config.auto_migrate {
        tracing::info!("Auto-migration enabled, running database migrations");
        crate::storage::migrations::run_migrations(&pool).await?;
    }

    Ok(pool)
}

fn validate_config(config: &DatabaseConfig) -> Result<()> {
    if config.max_connections == 0 {
        return Err(Error::config("max_connections must be greater than 0"));
    }

    if config.min_connections > config.max_connections {
        return Err(Error::config("min_connections cannot be greater than max_connections"));
    }

    if !config.url.starts_with("sqlite:") {
        return Err(Error::config("database URL must start with 'sqlite:'"));
    }

    Ok(())
}

/// Strip query parameters before a URL is written to the logs
fn sanitize_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{}?***", base),
        None => url.to_string(),
    }
}
