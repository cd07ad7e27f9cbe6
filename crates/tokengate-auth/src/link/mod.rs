//! Signed links for password reset and email verification.

pub mod signer;

pub use signer::{LinkPurpose, LinkSigner, VerifiedLink};
