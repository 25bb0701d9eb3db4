//! # Metrics Collection
//!
//! Counters for the identity flows. The `metrics` facade is a no-op until an
//! exporter is installed, so recording is always safe to call.

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};
use metrics::{counter, describe_counter, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

const AUTHENTICATION_STATUSES: &[&str] = &[
    "success",
    "missing_token",
    "invalid_token",
    "not_found",
    "inactive",
    "invalid_credentials",
    "forbidden",
    "error",
];

const TOKEN_KINDS: &[&str] = &["access", "refresh"];

const RESET_OUTCOMES: &[&str] = &["requested", "unknown_email", "consumed", "rejected"];

/// Install the Prometheus exporter when a listener address is configured.
pub fn init_metrics(config: &ObservabilityConfig) -> Result<bool> {
    let Some(address) = config.metrics_address.as_deref() else {
        return Ok(false);
    };

    let socket_addr: SocketAddr = address.parse().map_err(|e| {
        Error::config(format!("Invalid metrics bind address '{}': {}", address, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| Error::config(format!("Failed to initialize metrics exporter: {}", e)))?;

    register_auth_metrics();

    info!(metrics_addr = %socket_addr, service_name = %config.service_name, "Metrics collection initialized");
    Ok(true)
}

/// Describe every counter and seed its label sets so exports appear before the first event.
pub fn register_auth_metrics() {
    describe_counter!(
        "auth_authentications_total",
        Unit::Count,
        "Authentication attempts grouped by outcome"
    );
    describe_counter!("auth_tokens_issued_total", Unit::Count, "Signed tokens issued by kind");
    describe_counter!(
        "auth_password_resets_total",
        Unit::Count,
        "Password reset requests and consumptions by outcome"
    );
    describe_counter!("auth_registrations_total", Unit::Count, "Accounts created");

    for status in AUTHENTICATION_STATUSES {
        counter!("auth_authentications_total", "status" => *status).absolute(0);
    }
    for kind in TOKEN_KINDS {
        counter!("auth_tokens_issued_total", "kind" => *kind).absolute(0);
    }
    for outcome in RESET_OUTCOMES {
        counter!("auth_password_resets_total", "outcome" => *outcome).absolute(0);
    }
    counter!("auth_registrations_total").absolute(0);
}

/// Record a login or gate outcome.
pub fn record_authentication(status: &'static str) {
    counter!("auth_authentications_total", "status" => status).increment(1);
}

pub fn record_token_issued(kind: &'static str) {
    counter!("auth_tokens_issued_total", "kind" => kind).increment(1);
}

pub fn record_password_reset(outcome: &'static str) {
    counter!("auth_password_resets_total", "outcome" => outcome).increment(1);
}

pub fn record_registration() {
    counter!("auth_registrations_total").increment(1);
}
