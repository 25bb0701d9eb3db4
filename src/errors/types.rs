//! # Error Types
//!
//! Error types for the InCrime identity service using `thiserror`.

use std::fmt;

/// Custom result type for identity operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the identity service
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violations (username, email)
    #[error("{0}")]
    Conflict(String),

    /// Authentication errors
    #[error("{message}")]
    Auth { message: String, error_type: AuthErrorType },

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found errors
    #[error("{resource_type} not found")]
    NotFound { resource_type: String, id: String },

    /// Presented reset token is unknown, superseded, consumed or expired
    #[error("Invalid or expired reset token")]
    ResetTokenInvalid,

    /// Database and storage errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// Timeout errors
    #[error("Operation timed out: {operation} after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    /// Network transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Authentication error subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorType {
    MissingToken,
    InvalidToken,
    AccountNotFound,
    AccountDeactivated,
    InvalidCredentials,
}

impl fmt::Display for AuthErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthErrorType::MissingToken => write!(f, "missing_token"),
            AuthErrorType::InvalidToken => write!(f, "invalid_token"),
            AuthErrorType::AccountNotFound => write!(f, "account_not_found"),
            AuthErrorType::AccountDeactivated => write!(f, "account_deactivated"),
            AuthErrorType::InvalidCredentials => write!(f, "invalid_credentials"),
        }
    }
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a conflict error
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict(message.into())
    }

    /// Create an authentication error
    pub fn auth<S: Into<String>>(message: S, error_type: AuthErrorType) -> Self {
        Self::Auth { message: message.into(), error_type }
    }

    /// Create a forbidden error
    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden(message.into())
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, id: I) -> Self {
        Self::NotFound { resource_type: resource_type.into(), id: id.into() }
    }

    /// Create a database error with context
    pub fn database<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Database { source, context: context.into() }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, duration_ms: u64) -> Self {
        Self::Timeout { operation: operation.into(), duration_ms }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get the HTTP status code that should be returned for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::Conflict(_) | Error::ResetTokenInvalid => 400,
            Error::Auth { .. } => 401,
            Error::Forbidden(_) => 403,
            Error::NotFound { .. } => 404,
            Error::Config(_)
            | Error::Database { .. }
            | Error::Timeout { .. }
            | Error::Transport(_)
            | Error::Io(_)
            | Error::Internal(_) => 500,
        }
    }

    /// True when the underlying store rejected a write on a uniqueness constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database { source, .. } => source
                .as_database_error()
                .map(|db_err| db_err.is_unique_violation())
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        Self::Database { source: error, context: "Database operation failed".to_string() }
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        Self::Database {
            source: sqlx::Error::Migrate(Box::new(error)),
            context: "Database migration failed".to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_validation_messages(&errors, &mut messages);
        messages.sort();
        messages.dedup();

        Self::validation(messages.join("; "))
    }
}

/// Walk nested section errors so a bad field deep in the config still surfaces.
fn collect_validation_messages(errors: &validator::ValidationErrors, out: &mut Vec<String>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                out.extend(field_errors.iter().map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value for {}", field),
                }));
            }
            ValidationErrorsKind::Struct(nested) => collect_validation_messages(nested, out),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect_validation_messages(nested, out);
                }
            }
        }
    }
}
