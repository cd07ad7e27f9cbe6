//! Account services.

pub mod recovery;
pub mod service;

pub use recovery::{RecoveryService, VerificationStatus};
pub use service::{Registration, UserService};
