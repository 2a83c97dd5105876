//! Upstream access.
//!
//! [`RemoteFetcher`] is the seam between the fetch path and the network.
//! [`HttpFetcher`] is the production implementation; tests substitute their
//! own to count calls or to hold a fetch open.

mod client;

pub use client::HttpFetcher;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::Result;

/// Default base URL of the upstream API.
pub const DEFAULT_BASE_URL: &str = "https://discord.com/api/v8";

/// Default authorization scheme placed before the token.
pub const DEFAULT_AUTH_SCHEME: &str = "Bot";

/// Fetches raw resource payloads from the upstream API.
///
/// Implementations return the response body verbatim and never retry.
/// A non-success status maps to `UpstreamRejected`; transport failures map
/// to `Unreachable` or `Timeout`.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetcher name for logging/debugging.
    fn name(&self) -> &str;

    /// Fetch the resource at `path` (e.g. `/users/123...`).
    async fn fetch(&self, path: &str) -> Result<Bytes>;
}

/// Connection settings for [`HttpFetcher`].
///
/// ```rust
/// # use huginn::upstream::UpstreamConfig;
/// # use std::time::Duration;
/// let config = UpstreamConfig::new("my-token")
///     .base_url("http://localhost:8081")
///     .timeout(Duration::from_secs(5));
/// assert_eq!(config.auth_scheme, "Bot");
/// ```
#[derive(Clone)]
pub struct UpstreamConfig {
    /// Base URL the resource paths are appended to.
    pub base_url: String,
    /// Credential sent in the `Authorization` header.
    pub token: String,
    /// Scheme preceding the token in the `Authorization` header. Default: `Bot`.
    pub auth_scheme: String,
    /// Overall request timeout. Default: 10s.
    pub timeout: Duration,
}

impl UpstreamConfig {
    /// Create a config for `token` with default URL, scheme and timeout.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.auth_scheme = scheme.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// Keep the token out of debug output.
impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("auth_scheme", &self.auth_scheme)
            .field("timeout", &self.timeout)
            .finish()
    }
}
