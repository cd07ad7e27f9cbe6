//! # tokengate-core
//!
//! Core crate for TokenGate. Contains configuration schemas, the unified
//! error system, and the traits implemented by the infrastructure crates
//! (cache backends, mail transports).
//!
//! This crate has **no** internal dependencies on other TokenGate crates.

pub mod config;
pub mod error;
pub mod result;
pub mod timeout;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
