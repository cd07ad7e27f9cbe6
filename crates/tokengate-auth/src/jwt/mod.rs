//! Signed, expiring tokens.

pub mod claims;
pub mod codec;

pub use claims::{Claims, TokenType};
pub use codec::{JwtCodec, MintedToken, fingerprint};
