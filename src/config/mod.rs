//! # Configuration Management
//!
//! Process-wide configuration, loaded once at startup and injected into the
//! services that need it.

pub mod settings;

pub use settings::{
    ApiServerConfig, AppConfig, AuthConfig, BootstrapConfig, DatabaseConfig, LogFormat,
    ObservabilityConfig,
};
