//! Domain types shared by storage, services and the HTTP layer.

pub mod id;

pub use id::{ApplicationId, UserId};
