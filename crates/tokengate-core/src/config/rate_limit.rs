//! Request throttling configuration.

use serde::{Deserialize, Serialize};

/// Token-bucket settings for the auth routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether throttling is applied.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Bucket size per client.
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Tokens added per second.
    #[serde(default = "default_refill")]
    pub refill_per_second: f64,
    /// Key clients on the first `x-forwarded-for` hop instead of the peer
    /// address. Only safe behind a proxy that overwrites the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            burst: default_burst(),
            refill_per_second: default_refill(),
            trust_forwarded_for: false,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_burst() -> u32 {
    10
}

fn default_refill() -> f64 {
    10.0 / 60.0
}
