//! # tokengate-service
//!
//! Account flows that sit around the token core: registration, profile
//! updates, deactivation, password reset, and email verification. Mail is
//! handed to a [`MailDispatcher`] and never awaited by the caller.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod mail;
pub mod user;

pub use mail::{LogMailer, MailDispatcher, SmtpMailer};
pub use user::{RecoveryService, Registration, UserService, VerificationStatus};

#[cfg(test)]
mod test_support;
