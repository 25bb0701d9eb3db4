//! Repository modules for data access

pub mod account;

pub use account::{AccountRepository, NewAccount, ProfileUpdate, SqlxAccountRepository};
