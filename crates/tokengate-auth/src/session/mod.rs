//! Session lifecycle: login, refresh, logout, password change.

pub mod manager;

pub use manager::{SessionManager, TokenPair};
