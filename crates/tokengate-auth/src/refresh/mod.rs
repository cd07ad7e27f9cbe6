//! Durable refresh tokens.

pub mod store;

pub use store::RefreshTokenStore;
