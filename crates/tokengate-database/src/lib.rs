//! # tokengate-database
//!
//! PostgreSQL connection management and the repository layer for users and
//! refresh tokens. Each repository is a trait with a PostgreSQL
//! implementation and an in-process implementation used for tests and
//! database-less deployments.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{RefreshTokenRepository, UserRepository};
