//! Bearer token to authenticated principal.

pub mod resolver;

pub use resolver::{IdentityResolver, Principal};
