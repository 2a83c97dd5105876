//! Per-client admission control.
//!
//! [`RateLimiter`] admits up to `max_requests` requests per client identity
//! in each fixed window. The window opens on the identity's first request
//! and resets once `window` has elapsed; the request after the last
//! admitted one is rejected until then. Rejected requests are not queued.
//!
//! Identities are derived from client-supplied forwarding headers (see
//! [`client_identity()`]), which any client can forge. The limiter throttles
//! well-behaved traffic; it is not a defence against a determined client.

mod identity;

pub use identity::{UNKNOWN_IDENTITY, client_identity};

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use http::StatusCode;
use moka::sync::Cache;
use tokio::time::Instant;
use tracing::warn;

use crate::telemetry;

/// Default number of requests admitted per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 11;

/// Default message returned to rejected clients.
pub const DEFAULT_MESSAGE: &str = "You have reached maximum request limit.";

/// Configuration for the rate limiter.
///
/// ```rust
/// # use huginn::RateLimitConfig;
/// # use std::time::Duration;
/// let config = RateLimitConfig::new()
///     .max_requests(11)
///     .window(Duration::from_secs(10));
/// assert_eq!(config.status.as_u16(), 429);
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests admitted per identity per window. Default: 11.
    pub max_requests: u32,
    /// Window length. Default: 1s.
    pub window: Duration,
    /// Status returned on rejection. Default: 429.
    pub status: StatusCode,
    /// Plain-text body returned on rejection.
    pub message: String,
    /// Headers consulted, in order, to identify the client.
    /// Default: `X-Forwarded-For`, `X-Real-IP`.
    pub identity_headers: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: Duration::from_secs(1),
            status: StatusCode::TOO_MANY_REQUESTS,
            message: DEFAULT_MESSAGE.to_string(),
            identity_headers: vec!["X-Forwarded-For".to_string(), "X-Real-IP".to_string()],
        }
    }
}

impl RateLimitConfig {
    /// Create a new config with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_requests(mut self, n: u32) -> Self {
        self.max_requests = n;
        self
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn identity_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identity_headers = headers.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allowed {
        /// Requests left for this identity in the current window.
        remaining: u32,
    },
    /// The request is over the limit.
    Rejected {
        /// Time until the current window closes.
        retry_after: Duration,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client identity.
///
/// Each identity owns a mutex-guarded window, so the check-and-increment is
/// atomic per identity while distinct identities never contend. Windows of
/// identities idle for a full window are dropped.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Cache<String, Arc<Mutex<Window>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        // An identity idle for a whole window has nothing left to remember.
        let windows = Cache::builder()
            .time_to_idle(config.window.max(Duration::from_millis(1)))
            .build();
        Self { config, windows }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request from `identity` and decide whether it may proceed.
    pub fn admit(&self, identity: &str) -> Decision {
        let now = Instant::now();
        let slot = self.windows.get_with_by_ref(identity, || {
            Arc::new(Mutex::new(Window {
                started: now,
                count: 0,
            }))
        });
        let mut window = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= self.config.window {
            window.started = now;
            window.count = 0;
        }

        if window.count < self.config.max_requests {
            window.count += 1;
            return Decision::Allowed {
                remaining: self.config.max_requests - window.count,
            };
        }

        let retry_after = self
            .config
            .window
            .saturating_sub(now.saturating_duration_since(window.started));
        warn!(
            identity,
            limit = self.config.max_requests,
            window_ms = self.config.window.as_millis() as u64,
            "request rejected by rate limiter"
        );
        metrics::counter!(telemetry::RATE_LIMITED_TOTAL).increment(1);
        Decision::Rejected { retry_after }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn limiter(max: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(
            RateLimitConfig::new()
                .max_requests(max)
                .window(Duration::from_secs(window_secs)),
        )
    }

    #[test]
    fn default_config_matches_documented_values() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 11);
        assert_eq!(config.window, Duration::from_secs(1));
        assert_eq!(config.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(config.message, DEFAULT_MESSAGE);
        assert_eq!(config.identity_headers, ["X-Forwarded-For", "X-Real-IP"]);
    }

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_limit_then_rejects() {
        let limiter = limiter(3, 10);
        assert_eq!(limiter.admit("a"), Decision::Allowed { remaining: 2 });
        assert_eq!(limiter.admit("a"), Decision::Allowed { remaining: 1 });
        assert_eq!(limiter.admit("a"), Decision::Allowed { remaining: 0 });
        assert!(!limiter.admit("a").is_allowed());
        assert!(!limiter.admit("a").is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn identities_are_independent() {
        let limiter = limiter(1, 10);
        assert!(limiter.admit("a").is_allowed());
        assert!(!limiter.admit("a").is_allowed());
        assert!(limiter.admit("b").is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn window_resets_after_elapsing() {
        let limiter = limiter(2, 10);
        assert!(limiter.admit("a").is_allowed());
        assert!(limiter.admit("a").is_allowed());
        assert!(!limiter.admit("a").is_allowed());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(limiter.admit("a"), Decision::Allowed { remaining: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_counts_down_to_window_end() {
        let limiter = limiter(1, 10);
        assert!(limiter.admit("a").is_allowed());
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(
            limiter.admit("a"),
            Decision::Rejected {
                retry_after: Duration::from_secs(6)
            }
        );
    }

    #[test]
    fn contended_identity_admits_exactly_the_limit() {
        let limiter = limiter(11, 60);
        let admitted = AtomicU32::new(0);

        std::thread::scope(|scope| {
            for _ in 0..64 {
                scope.spawn(|| {
                    for _ in 0..10 {
                        if limiter.admit("x").is_allowed() {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(admitted.load(Ordering::SeqCst), 11);
        assert!(!limiter.admit("x").is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_limit_rejects_everything() {
        let limiter = limiter(0, 10);
        assert!(!limiter.admit("a").is_allowed());
    }
}
