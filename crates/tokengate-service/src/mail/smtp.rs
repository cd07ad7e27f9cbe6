//! SMTP transport for account mail.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, Message, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::info;

use tokengate_auth::jwt::fingerprint;
use tokengate_core::config::MailConfig;
use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;
use tokengate_core::traits::Mailer;

use super::log::link_token;

/// [`Mailer`] that delivers through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    server: String,
    enabled: bool,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("server", &self.server)
            .field("from", &self.from.to_string())
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl SmtpMailer {
    /// Builds the transport. No connection is opened until the first send.
    pub fn new(config: &MailConfig) -> AppResult<Self> {
        let from = config.from_address.parse::<Mailbox>().map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid mail.from_address", e)
        })?;

        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to configure SMTP transport",
                    e,
                )
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
        }
        .port(config.port)
        .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        let builder = if config.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
        };

        Ok(Self {
            transport: builder.build(),
            from,
            server: config.server.clone(),
            enabled: config.enabled,
        })
    }

    fn compose(&self, to: &str, subject: &str, body: String) -> AppResult<Message> {
        let to = to.parse::<Mailbox>().map_err(|e| {
            AppError::with_source(ErrorKind::BadRequest, "Invalid recipient address", e)
        })?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to build mail", e))
    }

    async fn deliver(&self, kind: &'static str, message: Message, link: &str) -> AppResult<()> {
        if !self.enabled {
            info!(kind, "Mail disabled; message dropped");
            return Ok(());
        }

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "SMTP delivery failed", e))?;

        info!(
            kind,
            server = %self.server,
            link_fingerprint = %fingerprint(link_token(link)),
            "Mail sent"
        );
        Ok(())
    }
}

fn reset_body(link: &str) -> String {
    format!(
        "We received a request to reset your password.\n\n\
         Open the following link to choose a new one:\n{link}\n\n\
         If you did not ask for this, you can ignore this message."
    )
}

fn confirmation_body(link: &str) -> String {
    format!(
        "Please confirm your email address by opening the following link:\n{link}\n\n\
         If you did not create an account, you can ignore this message."
    )
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset_email(&self, email: &str, reset_link: &str) -> AppResult<()> {
        let message = self.compose(email, "Reset your password", reset_body(reset_link))?;
        self.deliver("password_reset", message, reset_link).await
    }

    async fn send_account_confirmation_email(
        &self,
        email: &str,
        verify_link: &str,
    ) -> AppResult<()> {
        let message = self.compose(
            email,
            "Confirm your email address",
            confirmation_body(verify_link),
        )?;
        self.deliver("account_confirmation", message, verify_link)
            .await
    }
}
