//! Shared resource cache with single-flight population.
//!
//! [`ResourceCache`] maps a [`CacheKey`] to the raw upstream payload. It is
//! safe to share across any number of request tasks: reads and writes go
//! through moka's concurrent hash table, so an entry is either absent or
//! fully present, never partially written.
//!
//! # Single-flight
//!
//! [`ResourceCache::get_or_fetch()`] coalesces concurrent misses on the same
//! key. The first caller runs its fetch future; every other caller that
//! arrives while that future is pending waits on it and receives the same
//! payload or the same error. Only successful payloads are stored, so a
//! failed fetch leaves the key empty and the next request tries again.
//!
//! # Growth
//!
//! Entries live until the process exits. There is no capacity bound and no
//! TTL.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use moka::future::Cache;

use crate::telemetry;
use crate::types::CacheKey;
use crate::{HuginnError, Result};

/// Thread-safe store of upstream payloads, keyed by kind and identifier.
#[derive(Clone)]
pub struct ResourceCache {
    entries: Cache<CacheKey, Bytes>,
}

impl ResourceCache {
    /// Create an empty, unbounded cache.
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().build(),
        }
    }

    /// Look up a cached payload.
    ///
    /// Returns `None` on cache miss. Emits cache hit/miss metrics.
    pub async fn get(&self, key: &CacheKey) -> Option<Bytes> {
        let kind = key.kind().as_str();
        match self.entries.get(key).await {
            Some(payload) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "kind" => kind).increment(1);
                Some(payload)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "kind" => kind).increment(1);
                None
            }
        }
    }

    /// Insert (or overwrite) the payload for `key`.
    pub async fn put(&self, key: CacheKey, payload: Bytes) {
        self.entries.insert(key, payload).await;
    }

    /// Return the cached payload, or populate it by running `fetch`.
    ///
    /// At most one `fetch` runs per key at a time; concurrent callers for
    /// the same key share its outcome. Errors are returned to every waiter
    /// and are not cached.
    pub async fn get_or_fetch<F>(&self, key: &CacheKey, fetch: F) -> Result<Bytes>
    where
        F: Future<Output = Result<Bytes>>,
    {
        if let Some(payload) = self.get(key).await {
            return Ok(payload);
        }
        self.entries
            .try_get_with(key.clone(), fetch)
            .await
            .map_err(Arc::<HuginnError>::unwrap_or_clone)
    }

    /// Number of entries currently in the cache.
    ///
    /// moka applies writes lazily, so this may trail very recent inserts.
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}
