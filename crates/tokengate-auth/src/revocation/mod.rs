//! Per-token revocation state.

pub mod cache;

pub use cache::{RevocationCache, RevocationReport, TokenState, ttl_from_seconds};
