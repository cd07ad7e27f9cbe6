//! Fire-and-forget mail dispatch.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use tokengate_core::traits::Mailer;

/// Runs each send on its own task so request handlers never wait on mail.
#[derive(Debug, Clone)]
pub struct MailDispatcher {
    mailer: Arc<dyn Mailer>,
}

impl MailDispatcher {
    /// Creates a dispatcher over the given transport.
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Queues a password-reset message. Failures are logged, not returned.
    pub fn send_password_reset(&self, email: String, link: String) -> JoinHandle<()> {
        let mailer = Arc::clone(&self.mailer);
        tokio::spawn(async move {
            match mailer.send_password_reset_email(&email, &link).await {
                Ok(()) => debug!(to = %email, "Password reset mail dispatched"),
                Err(e) => error!(to = %email, error = %e, "Password reset mail failed"),
            }
        })
    }

    /// Queues an account-confirmation message. Failures are logged, not
    /// returned.
    pub fn send_account_confirmation(&self, email: String, link: String) -> JoinHandle<()> {
        let mailer = Arc::clone(&self.mailer);
        tokio::spawn(async move {
            match mailer.send_account_confirmation_email(&email, &link).await {
                Ok(()) => debug!(to = %email, "Confirmation mail dispatched"),
                Err(e) => error!(to = %email, error = %e, "Confirmation mail failed"),
            }
        })
    }
}
