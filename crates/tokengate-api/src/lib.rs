//! # tokengate-api
//!
//! HTTP surface of TokenGate built on Axum. Every route lives under `/api`
//! and answers with the same JSON envelope, success or failure.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{Backends, build_app, build_state, serve};
pub use state::AppState;
