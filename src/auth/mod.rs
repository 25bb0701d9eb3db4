//! Authentication and authorization module entry point.
//!
//! Credential storage and verification, stateless access and refresh tokens,
//! the password reset flow, and the request gate that admits callers by token
//! and role.

pub mod account;
pub mod account_service;
pub mod admin_service;
pub mod bootstrap;
pub mod credentials;
pub mod gate;
pub mod hashing;
pub mod login_service;
pub mod middleware;
pub mod models;
pub mod reset;
pub mod token_service;

pub use account::{Account, AccountCredentials, Registration, Role};
pub use account_service::AccountService;
pub use admin_service::AdminService;
pub use credentials::{CredentialStore, ProfileChanges};
pub use gate::AccessGate;
pub use hashing::PasswordHasher;
pub use login_service::{AuthSession, LoginService};
pub use models::{AuthContext, AuthError};
pub use reset::{LoggingResetDelivery, ResetDelivery, ResetFlowManager, ResetRequest};
pub use token_service::{TokenError, TokenKind, TokenService};
