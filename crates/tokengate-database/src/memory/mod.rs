//! In-process repository implementations.
//!
//! Suitable for tests and single-node deployments without PostgreSQL. Data
//! lives only as long as the process.

pub mod refresh_token;
pub mod user;

pub use refresh_token::MemoryRefreshTokenRepository;
pub use user::MemoryUserRepository;
