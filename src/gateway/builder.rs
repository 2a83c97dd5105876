//! Builder for configuring fetch paths

use std::sync::Arc;
use std::time::Duration;

use super::FetchPath;
use crate::cache::ResourceCache;
use crate::limiter::{RateLimitConfig, RateLimiter};
use crate::upstream::{HttpFetcher, RemoteFetcher, UpstreamConfig};
use crate::{HuginnError, Result};

/// Default upper bound on a single upstream fetch.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Main entry point for creating fetch paths.
pub struct Huginn;

impl Huginn {
    /// Create a new builder for configuring the fetch path.
    pub fn builder() -> HuginnBuilder {
        HuginnBuilder::new()
    }
}

/// Builder for configuring a [`FetchPath`].
///
/// ```rust
/// # use huginn::{Huginn, RateLimitConfig};
/// # use std::time::Duration;
/// let path = Huginn::builder()
///     .token("my-token")
///     .rate_limit(RateLimitConfig::new().max_requests(11).window(Duration::from_secs(10)))
///     .build()
///     .unwrap();
/// assert_eq!(path.limiter().config().max_requests, 11);
/// ```
pub struct HuginnBuilder {
    token: Option<String>,
    base_url: Option<String>,
    auth_scheme: Option<String>,
    fetch_timeout: Option<Duration>,
    rate_limit: RateLimitConfig,
    fetcher: Option<Arc<dyn RemoteFetcher>>,
}

impl HuginnBuilder {
    pub fn new() -> Self {
        Self {
            token: None,
            base_url: None,
            auth_scheme: None,
            fetch_timeout: None,
            rate_limit: RateLimitConfig::default(),
            fetcher: None,
        }
    }

    /// Credential for the upstream API.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Override the upstream base URL (e.g. to point at a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Override the `Authorization` scheme (default: `Bot`).
    pub fn auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.auth_scheme = Some(scheme.into());
        self
    }

    /// Upper bound on a single upstream fetch (default: 10s).
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Configure the rate limiter.
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Use a custom fetcher instead of the HTTP client.
    ///
    /// When set, `token`, `base_url` and `auth_scheme` are ignored.
    pub fn fetcher(mut self, fetcher: Arc<dyn RemoteFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Build the fetch path.
    ///
    /// Fails with `Configuration` when no token and no custom fetcher
    /// were supplied, or when the fetch timeout is zero.
    pub fn build(self) -> Result<FetchPath> {
        let fetch_timeout = self.fetch_timeout.unwrap_or(DEFAULT_FETCH_TIMEOUT);
        if fetch_timeout.is_zero() {
            return Err(HuginnError::Configuration(
                "fetch timeout must be greater than zero".to_string(),
            ));
        }

        let fetcher: Arc<dyn RemoteFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => {
                let token = self.token.ok_or_else(|| {
                    HuginnError::Configuration("no upstream token configured".to_string())
                })?;
                let mut config = UpstreamConfig::new(token).timeout(fetch_timeout);
                if let Some(url) = self.base_url {
                    config = config.base_url(url);
                }
                if let Some(scheme) = self.auth_scheme {
                    config = config.auth_scheme(scheme);
                }
                Arc::new(HttpFetcher::new(config)?)
            }
        };

        Ok(FetchPath::new(
            ResourceCache::new(),
            fetcher,
            RateLimiter::new(self.rate_limit),
            fetch_timeout,
        ))
    }
}

impl Default for HuginnBuilder {
    fn default() -> Self {
        Self::new()
    }
}
