//! Tests for [`ResourceCache`]: concurrent access and single-flight population.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::join_all;

use huginn::{CacheKey, HuginnError, ResourceCache, ResourceKind};

fn user(id: &str) -> CacheKey {
    CacheKey::new(ResourceKind::User, id)
}

#[tokio::test]
async fn concurrent_misses_run_one_fetch() {
    let cache = ResourceCache::new();
    let calls = AtomicU32::new(0);
    let calls = &calls;
    let key = user("1234567890123456");

    let results = join_all((0..16).map(|_| {
        cache.get_or_fetch(&key, async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Bytes::from_static(b"payload"))
        })
    }))
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    for result in results {
        assert_eq!(result.unwrap(), Bytes::from_static(b"payload"));
    }
}

#[tokio::test]
async fn concurrent_misses_share_one_error() {
    let cache = ResourceCache::new();
    let calls = AtomicU32::new(0);
    let calls = &calls;
    let key = user("1234567890123456");

    let results = join_all((0..8).map(|_| {
        cache.get_or_fetch(&key, async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(HuginnError::UpstreamRejected { status: 503 })
        })
    }))
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    for result in results {
        assert!(matches!(
            result,
            Err(HuginnError::UpstreamRejected { status: 503 })
        ));
    }
    assert!(cache.get(&key).await.is_none());
}

#[tokio::test]
async fn different_keys_fetch_independently() {
    let cache = ResourceCache::new();
    let calls = AtomicU32::new(0);
    let calls = &calls;
    let keys: Vec<CacheKey> = (0..4)
        .map(|i| user(&format!("100000000000000{i}")))
        .collect();

    join_all(keys.iter().map(|key| {
        cache.get_or_fetch(key, async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from(key.to_string()))
        })
    }))
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    for key in &keys {
        assert_eq!(
            cache.get(key).await,
            Some(Bytes::from(key.to_string()))
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_writers_and_readers() {
    let cache = Arc::new(ResourceCache::new());
    let mut handles = Vec::new();

    // Spawn writers
    for i in 0..32 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            let key = user(&format!("{i:016}"));
            cache.put(key, Bytes::from(vec![i as u8; 1024])).await;
        }));
    }

    // Spawn concurrent readers
    for i in 0..32 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            // May or may not see the entry yet, but never a partial one
            if let Some(payload) = cache.get(&user(&format!("{i:016}"))).await {
                assert_eq!(payload.len(), 1024);
                assert!(payload.iter().all(|b| *b == i as u8));
            }
        }));
    }

    for h in handles {
        h.await.expect("task panicked");
    }

    // After all writers finish, all entries should be present
    for i in 0..32 {
        assert!(cache.get(&user(&format!("{i:016}"))).await.is_some());
    }
}

#[tokio::test]
async fn failed_fetch_then_success_on_retry() {
    let cache = ResourceCache::new();
    let key = user("1234567890123456");

    let first = cache
        .get_or_fetch(&key, async { Err(HuginnError::Unreachable("refused".into())) })
        .await;
    assert!(first.is_err());

    let second = cache
        .get_or_fetch(&key, async { Ok(Bytes::from_static(b"ok")) })
        .await
        .unwrap();
    assert_eq!(second, Bytes::from_static(b"ok"));
}

#[tokio::test]
async fn default_creates_empty_cache() {
    let cache = ResourceCache::default();
    assert!(cache.get(&user("1234567890123456")).await.is_none());
}
