//! Password hashing with bcrypt.
//!
//! bcrypt is deliberately slow, so every hash and verify runs on the blocking
//! pool under a timeout instead of stalling a runtime worker.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::warn;

use crate::errors::{Error, Result};

/// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_CHARS: usize = 8;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Check a candidate secret against the length limits before it is hashed.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(Error::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(Error::validation(format!(
            "Password must be at most {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }

    Ok(())
}

/// Salted adaptive hashing of account secrets.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    timeout: Duration,
    dummy_hash: Arc<OnceLock<String>>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost, timeout: DEFAULT_TIMEOUT, dummy_hash: Arc::new(OnceLock::new()) }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a secret with a fresh random salt.
    pub async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_owned();
        let cost = self.cost;
        self.run_blocking("password_hash", move || {
            bcrypt::hash(password, cost)
                .map_err(|e| Error::internal(format!("Password hashing failed: {}", e)))
        })
        .await
    }

    /// `Ok(false)` on mismatch; an error only when the digest cannot be parsed.
    ///
    /// A candidate longer than bcrypt's input limit never matches, since bcrypt
    /// would otherwise ignore everything past the 72nd byte.
    pub async fn verify(&self, password: &str, digest: &str) -> Result<bool> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }

        let password = password.to_owned();
        let digest = digest.to_owned();
        self.run_blocking("password_verify", move || {
            bcrypt::verify(password, &digest)
                .map_err(|e| Error::internal(format!("Stored password digest is invalid: {}", e)))
        })
        .await
    }

    /// Spend the same work as a real verification against a throwaway digest.
    ///
    /// Used when a login names no account, so timing does not reveal which
    /// usernames exist.
    pub async fn verify_dummy(&self, password: &str) {
        let digest = match self.dummy_hash.get() {
            Some(digest) => digest.clone(),
            None => match self.hash("incrime-dummy-credential").await {
                Ok(digest) => self.dummy_hash.get_or_init(|| digest).clone(),
                Err(e) => {
                    warn!(error = %e, "failed to prepare dummy password digest");
                    return;
                }
            },
        };

        if let Err(e) = self.verify(password, &digest).await {
            warn!(error = %e, "dummy password verification failed unexpectedly");
        }
    }

    async fn run_blocking<T, F>(&self, operation: &'static str, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(task);
        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                Err(Error::internal(format!("{} task failed: {}", operation, join_error)))
            }
            Err(_) => Err(Error::timeout(operation, self.timeout.as_millis() as u64)),
        }
    }
}
