//! # Observability Infrastructure
//!
//! Structured logging through `tracing` and Prometheus counters through
//! `metrics`.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_config_info};
pub use metrics::init_metrics;

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use ::tracing::info;

/// Initialize logging, then metrics if a listener address is configured.
pub fn init_observability(config: &ObservabilityConfig) -> Result<()> {
    init_logging(config)?;
    let metrics_enabled = init_metrics(config)?;

    info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        log_format = ?config.log_format,
        metrics_enabled,
        "Observability initialized successfully"
    );

    Ok(())
}
