//! Cache service trait and typed helpers.

use std::future::Future;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::CacheStats;
use crate::error::Result;

/// Key-value cache with per-key expiry.
///
/// Implementations must be thread-safe and fail open: a store that cannot be
/// reached degrades to misses and no-ops so callers fall through to the
/// system of record. Only caller mistakes (oversized keys, malformed
/// patterns) come back as errors.
///
/// # Implementations
///
/// - [`crate::cache::RedisCache`] - distributed store shared between instances
/// - [`crate::cache::MemoryCache`] - process-local store
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns the stored value, or `None` on a miss, an expired entry, or a
    /// failing store.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` for `ttl_seconds` (backend default when `None`),
    /// replacing any previous entry.
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<()>;

    /// Removes an entry. Returns whether something was removed; deleting an
    /// absent key is not an error.
    async fn del(&self, key: &str) -> Result<bool>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Removes every key matching a glob (see [`crate::cache::GlobPattern`])
    /// and returns how many were removed.
    async fn clear_pattern(&self, pattern: &str) -> Result<u64>;

    /// Seconds until `key` expires. `None` when the key is absent or has no
    /// expiry.
    async fn get_ttl(&self, key: &str) -> Result<Option<u64>>;

    /// Replaces the expiry of an existing key, keeping its value. Returns
    /// `false` without doing anything when the key is absent.
    async fn update_ttl(&self, key: &str, ttl_seconds: u64) -> Result<bool>;

    /// Checks whether the backing store answers.
    async fn health_check(&self) -> bool;

    async fn stats(&self) -> CacheStats;

    /// Drops expired entries the backend does not expire on its own.
    async fn purge_expired(&self) -> usize {
        0
    }

    /// Short backend identifier for logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// JSON helpers available on every [`CacheService`].
#[async_trait]
pub trait CacheExt: CacheService {
    /// Reads and decodes a JSON value. A payload that no longer decodes into
    /// `T` is dropped and reported as a miss.
    async fn get_json<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        let Some(raw) = self.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "dropping undecodable cache entry");
                self.del(key).await?;
                Ok(None)
            }
        }
    }

    /// Encodes `value` as JSON and stores it.
    async fn set_json<T>(&self, key: &str, value: &T, ttl_seconds: Option<u64>) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw, ttl_seconds).await
    }

    /// Read-through lookup: returns the cached value, or runs `fetch`
    /// against the system of record and caches what it returns.
    ///
    /// Cache problems never fail the call; only `fetch` errors propagate.
    async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        ttl_seconds: Option<u64>,
        fetch: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        E: Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = std::result::Result<T, E>> + Send,
    {
        let cached: Result<Option<T>> = self.get_json(key).await;
        match cached {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => debug!(key, "read-through miss"),
            Err(e) => warn!(key, error = %e, "cache lookup failed, fetching"),
        }

        let fresh = fetch().await?;
        if let Err(e) = self.set_json(key, &fresh, ttl_seconds).await {
            warn!(key, error = %e, "failed to populate cache");
        }
        Ok(fresh)
    }
}

impl<C: CacheService + ?Sized> CacheExt for C {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct University {
        id: u32,
        name: String,
    }

    fn oxford() -> University {
        University {
            id: 7,
            name: "Oxford".to_string(),
        }
    }

    #[tokio::test]
    async fn test_json_roundtrip() {
        let cache = MemoryCache::new(100, 300);
        cache
            .set_json("universities:7", &oxford(), None)
            .await
            .unwrap();

        let loaded: Option<University> = cache.get_json("universities:7").await.unwrap();
        assert_eq!(loaded, Some(oxford()));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss_and_dropped() {
        let cache = MemoryCache::new(100, 300);
        cache.set("universities:7", "not json", None).await.unwrap();

        let loaded: Option<University> = cache.get_json("universities:7").await.unwrap();

        assert!(loaded.is_none());
        assert!(!cache.exists("universities:7").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_or_fetch_only_fetches_on_miss() {
        let cache: Arc<dyn CacheService> = Arc::new(MemoryCache::new(100, 300));
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let uni = cache
                .get_or_fetch("universities:7", Some(60), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(oxford())
                })
                .await
                .unwrap();
            assert_eq!(uni, oxford());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_fetch_propagates_fetch_error_and_caches_nothing() {
        let cache = MemoryCache::new(100, 300);

        let result: std::result::Result<University, &str> = cache
            .get_or_fetch("universities:9", None, || async { Err("database offline") })
            .await;

        assert_eq!(result.unwrap_err(), "database offline");
        assert!(!cache.exists("universities:9").await.unwrap());
    }
}
