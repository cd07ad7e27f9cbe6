//! Outbound mail configuration.

use serde::{Deserialize, Serialize};

/// Settings for password-reset and verification mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Whether mail is dispatched at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Public base URL that emailed links point at.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sender address.
    #[serde(default = "default_from")]
    pub from_address: String,
    /// SMTP relay host. Empty means messages are only logged.
    #[serde(default)]
    pub server: String,
    /// SMTP server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Use STARTTLS.
    #[serde(default = "default_true")]
    pub use_tls: bool,
    /// SMTP username.
    #[serde(default)]
    pub username: String,
    /// SMTP password.
    #[serde(default, skip_serializing)]
    pub password: String,
    /// Deadline for one SMTP exchange.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl MailConfig {
    /// Whether an SMTP relay is configured.
    pub fn uses_smtp(&self) -> bool {
        !self.server.trim().is_empty()
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_base_url(),
            from_address: default_from(),
            server: String::new(),
            port: default_port(),
            use_tls: default_true(),
            username: String::new(),
            password: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_from() -> String {
    "no-reply@localhost".to_string()
}

fn default_port() -> u16 {
    587
}

fn default_timeout() -> u64 {
    10
}
