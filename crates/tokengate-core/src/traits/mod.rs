//! Core traits defined in `tokengate-core` and implemented by other crates.

pub mod cache;
pub mod mail;

pub use cache::CacheProvider;
pub use mail::Mailer;
