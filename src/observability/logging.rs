//! # Structured Logging
//!
//! Installs the global `tracing` subscriber. Output is human-readable by
//! default and newline-delimited JSON when `INCRIME_LOG_FORMAT=json`.

use crate::config::{LogFormat, ObservabilityConfig};
use crate::errors::{Error, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins over the configured level when both are present so a single
/// module can be turned up without editing the service configuration.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| Error::config(format!("Invalid log filter '{}': {}", config.log_level, e)))?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
    };

    result.map_err(|e| Error::config(format!("Failed to initialize logging: {}", e)))
}

/// Log the effective configuration once logging is up. Secrets are never included.
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        service = %config.observability.service_name,
        api_address = %config.api.socket_address(),
        cors_origin = ?config.api.cors_origin,
        database_in_memory = config.database.is_in_memory(),
        auto_migrate = config.database.auto_migrate,
        bcrypt_cost = config.auth.bcrypt_cost,
        expose_reset_token = config.auth.expose_reset_token,
        metrics_address = ?config.observability.metrics_address,
        "Configuration loaded"
    );

    if config.auth.expose_reset_token {
        tracing::warn!("Reset tokens will be echoed in API responses; never enable this in production");
    }
}
