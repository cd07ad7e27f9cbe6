//! Outbound mail collaborator.

use async_trait::async_trait;

use crate::result::AppResult;

/// Delivers account mail. Implementations render and transport the message;
/// callers only supply the recipient and the signed link.
#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug + 'static {
    /// Send the "reset your password" message.
    async fn send_password_reset_email(&self, email: &str, reset_link: &str) -> AppResult<()>;

    /// Send the "confirm your address" message.
    async fn send_account_confirmation_email(&self, email: &str, verify_link: &str)
    -> AppResult<()>;
}
