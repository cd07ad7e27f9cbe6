//! # tokengate-entity
//!
//! Domain entity models for TokenGate. Every struct here is either a table
//! row (deriving `sqlx::FromRow`) or the payload used to create/update one.

pub mod token;
pub mod user;
