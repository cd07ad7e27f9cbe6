//! Token bucket rate limiter middleware.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use tracing::warn;

use tokengate_core::config::RateLimitConfig;
use tokengate_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Buckets kept before idle, fully refilled ones are dropped.
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// In-memory token bucket rate limiter keyed by client address.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Client key → bucket state.
    buckets: Arc<DashMap<String, TokenBucket>>,
    /// Maximum tokens per bucket.
    max_tokens: u32,
    /// Token refill rate per second.
    refill_rate: f64,
    /// Key on `x-forwarded-for` instead of the peer address.
    trust_forwarded_for: bool,
}

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn refill(&mut self, now: Instant, max_tokens: f64, refill_rate: f64) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(max_tokens);
        self.last_refill = now;
    }
}

impl RateLimiter {
    /// Creates a new rate limiter.
    pub fn new(max_tokens: u32, refill_rate: f64) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            max_tokens,
            refill_rate,
            trust_forwarded_for: false,
        }
    }

    /// Keys clients on the first `x-forwarded-for` hop when set.
    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// Builds a limiter if throttling is enabled.
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        config.enabled.then(|| {
            Self::new(config.burst, config.refill_per_second)
                .trust_forwarded_for(config.trust_forwarded_for)
        })
    }

    /// Attempts to consume a token for the given key.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let max = f64::from(self.max_tokens);

        if self.buckets.len() >= MAX_TRACKED_CLIENTS {
            self.evict_idle(now);
        }

        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert(TokenBucket {
                tokens: max,
                last_refill: now,
            });
        bucket.refill(now, max, self.refill_rate);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn evict_idle(&self, now: Instant) {
        let max = f64::from(self.max_tokens);
        self.buckets.retain(|_, bucket| {
            bucket.refill(now, max, self.refill_rate);
            bucket.tokens < max
        });
    }
}

/// Client key: the peer IP, or the first `x-forwarded-for` hop when the
/// proxy header is trusted. `unknown` only when neither is available.
pub fn client_key(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(hop) = forwarded {
            return hop.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rejects the request with 429 once the client's bucket is empty.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(limiter) = &state.rate_limiter {
        let key = client_key(&request, limiter.trust_forwarded_for);
        if !limiter.check(&key) {
            warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
            return ApiError(AppError::rate_limited("Too many requests, slow down"))
                .into_response();
        }
    }
    next.run(request).await
}
