//! Cache-backed fetch path.
//!
//! [`FetchPath`] ties the pieces together for one request:
//!
//! 1. admission: the [`RateLimiter`] decides whether the client may proceed;
//! 2. lookup: a hit in the [`ResourceCache`] is returned immediately;
//! 3. fetch: on a miss, exactly one [`RemoteFetcher`] call runs per key,
//!    bounded by the fetch timeout, and every concurrent requester for that
//!    key receives its outcome;
//! 4. populate: a successful payload is stored, a failure is not.

mod builder;

pub use builder::{Huginn, HuginnBuilder};

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::cache::ResourceCache;
use crate::limiter::{Decision, RateLimiter};
use crate::types::{CacheKey, ResourceKind};
use crate::upstream::RemoteFetcher;
use crate::{HuginnError, Result};

/// Resolves resources from cache or upstream for rate-limited clients.
///
/// Cheap to share: wrap in an `Arc` and hand a clone to every request task.
pub struct FetchPath {
    cache: ResourceCache,
    fetcher: Arc<dyn RemoteFetcher>,
    limiter: RateLimiter,
    fetch_timeout: Duration,
}

impl FetchPath {
    pub(crate) fn new(
        cache: ResourceCache,
        fetcher: Arc<dyn RemoteFetcher>,
        limiter: RateLimiter,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            fetcher,
            limiter,
            fetch_timeout,
        }
    }

    /// The shared resource cache.
    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// The admission gate.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Upper bound on a single upstream fetch.
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Count a request from `client` against its rate limit.
    ///
    /// Returns `RateLimited` when the client is over its limit.
    pub fn admit(&self, client: &str) -> Result<()> {
        match self.limiter.admit(client) {
            Decision::Allowed { .. } => Ok(()),
            Decision::Rejected { retry_after } => Err(HuginnError::RateLimited { retry_after }),
        }
    }

    /// Admit `client`, then resolve `(kind, key)`.
    ///
    /// A rejected client never reaches the cache or the upstream.
    pub async fn handle(&self, client: &str, kind: ResourceKind, key: &str) -> Result<Bytes> {
        self.admit(client)?;
        self.resolve(kind, key).await
    }

    /// Return the payload for `(kind, key)` from cache, fetching it on a miss.
    ///
    /// Concurrent misses on the same key share one upstream call. Failed
    /// fetches (rejection, transport error, timeout) are reported to every
    /// waiter and leave the cache untouched.
    pub async fn resolve(&self, kind: ResourceKind, key: &str) -> Result<Bytes> {
        kind.validate_key(key)?;
        let cache_key = CacheKey::new(kind, key);

        self.cache
            .get_or_fetch(&cache_key, self.fetch(&cache_key))
            .await
    }

    async fn fetch(&self, cache_key: &CacheKey) -> Result<Bytes> {
        let path = cache_key.upstream_path();
        debug!(key = %cache_key, fetcher = self.fetcher.name(), "cache miss");

        let result = match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(&path)).await
        {
            Ok(result) => result,
            Err(_) => Err(HuginnError::Timeout(self.fetch_timeout)),
        };

        if let Err(ref e) = result {
            warn!(key = %cache_key, error = %e, "upstream fetch failed");
        }
        result
    }
}
