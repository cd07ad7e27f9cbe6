//! Mailer that records messages in the log instead of sending them.

use async_trait::async_trait;
use tracing::info;

use tokengate_auth::jwt::fingerprint;
use tokengate_core::config::MailConfig;
use tokengate_core::result::AppResult;
use tokengate_core::traits::Mailer;

/// [`Mailer`] for development and for deployments without an SMTP relay.
///
/// Signed links are credentials, so only their fingerprint reaches the log.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from_address: String,
    enabled: bool,
}

impl LogMailer {
    /// Creates a log mailer from mail configuration.
    pub fn new(config: &MailConfig) -> Self {
        Self {
            from_address: config.from_address.clone(),
            enabled: config.enabled,
        }
    }

    fn deliver(&self, kind: &'static str, to: &str, link: &str) {
        if !self.enabled {
            info!(kind, to = %to, "Mail disabled; message dropped");
            return;
        }
        info!(
            kind,
            from = %self.from_address,
            to = %to,
            link_fingerprint = %fingerprint(link_token(link)),
            "Mail sent"
        );
    }
}

/// The signed token carried by a mailed link, or the whole link when it has
/// no `token` parameter.
pub(crate) fn link_token(link: &str) -> &str {
    link.split_once("token=")
        .map(|(_, rest)| rest.split('&').next().unwrap_or(rest))
        .unwrap_or(link)
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset_email(&self, email: &str, reset_link: &str) -> AppResult<()> {
        self.deliver("password_reset", email, reset_link);
        Ok(())
    }

    async fn send_account_confirmation_email(
        &self,
        email: &str,
        verify_link: &str,
    ) -> AppResult<()> {
        self.deliver("account_confirmation", email, verify_link);
        Ok(())
    }
}
