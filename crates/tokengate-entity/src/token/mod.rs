//! Persisted refresh tokens.

pub mod refresh;

pub use refresh::{NewRefreshToken, RefreshToken};
