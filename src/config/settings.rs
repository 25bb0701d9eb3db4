//! # Configuration Settings
//!
//! Defines the configuration structure for the InCrime identity service and
//! loads it from the process environment.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

/// Minimum length accepted for either token signing secret.
pub const MIN_SIGNING_SECRET_LEN: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// HTTP API configuration
    #[validate(nested)]
    pub api: ApiServerConfig,

    /// Database configuration
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Token, hashing and reset settings
    #[validate(nested)]
    pub auth: AuthConfig,

    /// Seeded administrator
    #[validate(nested)]
    pub bootstrap: BootstrapConfig,

    /// Logging and metrics
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load every section from environment variables and validate the result.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            api: ApiServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            bootstrap: BootstrapConfig::from_env(),
            observability: ObservabilityConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(|e| Error::config(Error::from(e).to_string()))?;
        self.validate_custom()
    }

    /// Custom validation logic that goes beyond what the validator crate can do
    fn validate_custom(&self) -> Result<()> {
        if !self.database.url.starts_with("sqlite:") {
            return Err(Error::config("Database URL must start with 'sqlite:'"));
        }

        self.auth.validate_secrets()?;

        Ok(())
    }
}

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "API bind address cannot be empty"))]
    pub bind_address: String,

    /// Server port
    #[validate(range(min = 1, message = "API port must be between 1 and 65535"))]
    pub port: u16,

    /// Single allowed CORS origin (credentials are allowed, so no wildcard)
    pub cors_origin: Option<String>,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0".to_string(), port: 5000, cors_origin: None }
    }
}

impl ApiServerConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let port = match env_var("INCRIME_API_PORT").or_else(|| env_var("PORT")) {
            Some(raw) => parse_value("INCRIME_API_PORT", &raw)?,
            None => defaults.port,
        };

        Ok(Self {
            bind_address: env_var("INCRIME_API_BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port,
            // Origins are compared without a trailing slash.
            cors_origin: env_var("CLIENT_URL").map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    /// Get the server bind address
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(max = 50, message = "Min connections must be between 0 and 50"))]
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds (0 = no timeout)
    pub idle_timeout_seconds: u64,

    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/incrime.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Single-connection in-memory database with migrations applied on creation.
    ///
    /// An in-memory SQLite database lives exactly as long as its connection, so
    /// the pool is pinned to one connection that never idles out.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout_seconds: 5,
            idle_timeout_seconds: 0,
            auto_migrate: true,
        }
    }

    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get idle timeout as Duration (None if 0)
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    /// Check if this is an in-memory SQLite database
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// Create DatabaseConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            url: env_var("INCRIME_DATABASE_URL").unwrap_or(defaults.url),
            max_connections: env_parse(
                "INCRIME_DATABASE_MAX_CONNECTIONS",
                defaults.max_connections,
            )?,
            min_connections: env_parse(
                "INCRIME_DATABASE_MIN_CONNECTIONS",
                defaults.min_connections,
            )?,
            connect_timeout_seconds: env_parse(
                "INCRIME_DATABASE_CONNECT_TIMEOUT_SECONDS",
                defaults.connect_timeout_seconds,
            )?,
            idle_timeout_seconds: env_parse(
                "INCRIME_DATABASE_IDLE_TIMEOUT_SECONDS",
                defaults.idle_timeout_seconds,
            )?,
            auto_migrate: env_flag("INCRIME_DATABASE_AUTO_MIGRATE").unwrap_or(defaults.auto_migrate),
        })
    }
}

/// Token signing, password hashing and reset-flow configuration
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "JWT_SECRET cannot be empty"))]
    pub jwt_secret: String,

    /// HMAC secret for refresh tokens
    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "JWT_REFRESH_SECRET cannot be empty"))]
    pub jwt_refresh_secret: String,

    /// bcrypt work factor
    #[validate(range(min = 4, max = 31, message = "bcrypt cost must be between 4 and 31"))]
    pub bcrypt_cost: u32,

    /// Upper bound for a single hash or verify call
    #[validate(range(min = 1, message = "Hash timeout must be at least 1 second"))]
    pub hash_timeout_seconds: u64,

    /// Echo raw reset tokens in the forgot-password response (development only)
    pub expose_reset_token: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"***")
            .field("jwt_refresh_secret", &"***")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("hash_timeout_seconds", &self.hash_timeout_seconds)
            .field("expose_reset_token", &self.expose_reset_token)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "incrime-development-access-secret-change-me".to_string(),
            jwt_refresh_secret: "incrime-development-refresh-secret-change-me".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            hash_timeout_seconds: 10,
            expose_reset_token: false,
        }
    }
}

impl AuthConfig {
    /// Both signing secrets are required; there is no fallback for production use.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let jwt_secret = env_var("JWT_SECRET")
            .ok_or_else(|| Error::config("JWT_SECRET environment variable is required"))?;
        let jwt_refresh_secret = env_var("JWT_REFRESH_SECRET")
            .ok_or_else(|| Error::config("JWT_REFRESH_SECRET environment variable is required"))?;

        let development = env_var("NODE_ENV").map(|v| v == "development").unwrap_or(false);

        Ok(Self {
            jwt_secret,
            jwt_refresh_secret,
            bcrypt_cost: env_parse("INCRIME_BCRYPT_COST", defaults.bcrypt_cost)?,
            hash_timeout_seconds: env_parse(
                "INCRIME_HASH_TIMEOUT_SECONDS",
                defaults.hash_timeout_seconds,
            )?,
            expose_reset_token: env_flag("INCRIME_EXPOSE_RESET_TOKEN").unwrap_or(development),
        })
    }

    /// Get hash timeout as Duration
    pub fn hash_timeout(&self) -> Duration {
        Duration::from_secs(self.hash_timeout_seconds)
    }

    fn validate_secrets(&self) -> Result<()> {
        if self.jwt_secret.len() < MIN_SIGNING_SECRET_LEN
            || self.jwt_refresh_secret.len() < MIN_SIGNING_SECRET_LEN
        {
            return Err(Error::config(format!(
                "JWT secrets must be at least {} characters long",
                MIN_SIGNING_SECRET_LEN
            )));
        }

        if self.jwt_secret == self.jwt_refresh_secret {
            return Err(Error::config("JWT_SECRET and JWT_REFRESH_SECRET must differ"));
        }

        Ok(())
    }
}

/// Seeded administrator created on first start
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct BootstrapConfig {
    #[validate(length(min = 1, message = "Admin username cannot be empty"))]
    pub admin_username: String,

    #[validate(length(min = 1, message = "Admin full name cannot be empty"))]
    pub admin_full_name: String,

    #[validate(email(message = "ADMIN_EMAIL must be a valid email address"))]
    pub admin_email: String,

    #[serde(skip_serializing)]
    #[validate(length(min = 8, message = "ADMIN_PASSWORD must be at least 8 characters"))]
    pub admin_password: String,
}

impl std::fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("admin_username", &self.admin_username)
            .field("admin_full_name", &self.admin_full_name)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &"***")
            .finish()
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_full_name: "InCrime Admin".to_string(),
            admin_email: "admin@incrime.pk".to_string(),
            admin_password: "Admin@123456".to_string(),
        }
    }
}

impl BootstrapConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            admin_username: env_var("ADMIN_USERNAME").unwrap_or(defaults.admin_username),
            admin_full_name: env_var("ADMIN_FULL_NAME").unwrap_or(defaults.admin_full_name),
            admin_email: env_var("ADMIN_EMAIL").unwrap_or(defaults.admin_email),
            admin_password: env_var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::config(format!("Unknown log format '{}'", other))),
        }
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Tracing filter directive (e.g. `info`, `incrime=debug,tower_http=info`)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    pub log_format: LogFormat,

    /// Prometheus listener; metrics export is disabled when unset
    pub metrics_address: Option<String>,

    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_address: None,
            service_name: crate::APP_NAME.to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Logging settings never fail to load; an unknown format falls back to pretty output.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: env_var("INCRIME_LOG_LEVEL")
                .or_else(|| env_var("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            log_format: env_var("INCRIME_LOG_FORMAT")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(defaults.log_format),
            metrics_address: env_var("INCRIME_METRICS_ADDRESS"),
            service_name: defaults.service_name,
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_flag(key: &str) -> Option<bool> {
    env_var(key).map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env_var(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| Error::config(format!("Invalid value for {}: {}", key, e)))
}
