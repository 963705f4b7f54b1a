//! Backend selection.
//!
//! The factory probes Redis once, on first use, and hands out the chosen
//! backend for the rest of its lifetime. There is no failback: if Redis goes
//! away later the Redis backend keeps degrading every call to a miss, and if
//! Redis comes back after a failed probe the process stays on local memory
//! until restart.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::cache::{CacheService, MemoryCache, RedisCache};
use crate::clock::{system_clock, SharedClock};

/// Settings shared by both backends.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis connection string; `None` means local memory only
    pub redis_url: Option<String>,
    /// Upper bound on the startup connect + PING
    pub probe_timeout: Duration,
    /// Namespace prepended to Redis keys
    pub key_prefix: String,
    /// TTL in seconds for entries stored without one
    pub default_ttl: u64,
    /// Capacity of the memory backend
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            probe_timeout: Duration::from_millis(500),
            key_prefix: "studybridge:".to_string(),
            default_ttl: 300,
            max_entries: 10_000,
        }
    }
}

/// Chooses between [`RedisCache`] and [`MemoryCache`] and remembers the choice.
pub struct CacheFactory {
    config: CacheConfig,
    clock: SharedClock,
    selected: OnceCell<Arc<dyn CacheService>>,
    probes: AtomicUsize,
}

impl CacheFactory {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, system_clock())
    }

    /// Uses `clock` for the memory backend if it gets selected.
    pub fn with_clock(config: CacheConfig, clock: SharedClock) -> Self {
        Self {
            config,
            clock,
            selected: OnceCell::new(),
            probes: AtomicUsize::new(0),
        }
    }

    // == Get Cache ==
    /// Returns the selected backend, probing Redis on the first call.
    ///
    /// Concurrent first callers wait on a single probe.
    pub async fn get_cache(&self) -> Arc<dyn CacheService> {
        self.selected
            .get_or_init(|| self.select())
            .await
            .clone()
    }

    // == Is Available ==
    /// Probes Redis right now, independent of the cached decision.
    pub async fn is_available(&self) -> bool {
        self.connect_redis().await.is_some()
    }

    /// Number of probes run so far.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    async fn select(&self) -> Arc<dyn CacheService> {
        if let Some(redis) = self.connect_redis().await {
            info!(prefix = %self.config.key_prefix, "Cache backend selected: redis");
            return Arc::new(redis);
        }

        info!(
            max_entries = self.config.max_entries,
            "Cache backend selected: memory"
        );
        Arc::new(MemoryCache::with_clock(
            self.config.max_entries,
            self.config.default_ttl,
            self.clock.clone(),
        ))
    }

    async fn connect_redis(&self) -> Option<RedisCache> {
        let url = self.config.redis_url.as_deref()?;
        self.probes.fetch_add(1, Ordering::SeqCst);

        let connect = RedisCache::connect(url, self.config.default_ttl, &self.config.key_prefix);
        match tokio::time::timeout(self.config.probe_timeout, connect).await {
            Ok(Ok(redis)) => Some(redis),
            Ok(Err(e)) => {
                warn!(error = %e, "Redis probe failed");
                None
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.probe_timeout.as_millis() as u64,
                    "Redis probe timed out"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for CacheFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheFactory")
            .field("config", &self.config)
            .field(
                "selected",
                &self.selected.get().map(|cache| cache.backend_name()),
            )
            .finish()
    }
}
