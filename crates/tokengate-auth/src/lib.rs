//! # tokengate-auth
//!
//! The session/token lifecycle engine.
//!
//! ## Modules
//!
//! - `jwt`: signed, expiring tokens (mint, decode, remaining lifetime)
//! - `revocation`: per-token `active`/`blacklisted` state with TTL
//! - `refresh`: durable refresh tokens with a per-user active cap
//! - `session`: login, refresh, logout, password change orchestration
//! - `identity`: bearer token to authenticated principal
//! - `password`: Argon2id hashing and the new-password policy
//! - `link`: signed, purpose-bound links for reset and verification mail

pub mod identity;
pub mod jwt;
pub mod link;
pub mod password;
pub mod refresh;
pub mod revocation;
pub mod session;

#[cfg(test)]
mod test_support;

pub use identity::{IdentityResolver, Principal};
pub use jwt::{Claims, JwtCodec, TokenType};
pub use link::{LinkPurpose, LinkSigner, VerifiedLink};
pub use password::{PasswordHasher, PasswordValidator};
pub use refresh::RefreshTokenStore;
pub use revocation::{RevocationCache, TokenState};
pub use session::{SessionManager, TokenPair};
