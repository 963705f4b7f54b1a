//! Process-local cache backend.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheService, CacheStats, CacheStore, GlobPattern};
use crate::clock::SharedClock;
use crate::error::Result;

/// [`CacheService`] over an in-memory [`CacheStore`].
///
/// Used when Redis is not configured or did not answer the startup probe.
/// Entries live only as long as the process and are not shared between
/// instances.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<CacheStore>>,
}

impl MemoryCache {
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self::from_store(CacheStore::new(max_entries, default_ttl))
    }

    pub fn with_clock(max_entries: usize, default_ttl: u64, clock: SharedClock) -> Self {
        Self::from_store(CacheStore::with_clock(max_entries, default_ttl, clock))
    }

    pub fn from_store(store: CacheStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        // Write lock: a hit updates LRU order and stats
        let value = self.store.write().await.get(key);
        if value.is_some() {
            debug!(key, "Cache HIT");
        } else {
            debug!(key, "Cache MISS");
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<()> {
        self.store
            .write()
            .await
            .set(key.to_string(), value.to_string(), ttl_seconds)?;
        debug!(key, ?ttl_seconds, "Cache SET");
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        Ok(self.store.write().await.delete(key))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.store.write().await.exists(key))
    }

    async fn clear_pattern(&self, pattern: &str) -> Result<u64> {
        let pattern = GlobPattern::parse(pattern)?;
        let removed = self.store.write().await.clear_pattern(&pattern);
        debug!(%pattern, removed, "Cache pattern DEL");
        Ok(removed as u64)
    }

    async fn get_ttl(&self, key: &str) -> Result<Option<u64>> {
        Ok(self.store.write().await.ttl(key))
    }

    async fn update_ttl(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        Ok(self.store.write().await.update_ttl(key, ttl_seconds))
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    async fn purge_expired(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
