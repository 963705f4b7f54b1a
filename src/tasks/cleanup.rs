//! Periodic sweep task
//!
//! Background task that purges expired cache entries and drops rate limit
//! counters whose window has closed.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheService;
use crate::ratelimit::RateLimiters;

/// Spawns a background task that sweeps the cache and the limiters every
/// `cleanup_interval_secs` seconds.
///
/// Backends that expire entries themselves report nothing to purge. The
/// returned handle is aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(cache.clone(), limiters.clone(), 30);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(
    cache: Arc<dyn CacheService>,
    limiters: RateLimiters,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            backend = cache.backend_name(),
            "Starting cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let purged = cache.purge_expired().await;
            let swept = limiters.sweep_stale();

            if purged > 0 || swept > 0 {
                info!(purged, swept, "Cleanup: removed expired entries and stale counters");
            } else {
                debug!("Cleanup: nothing to remove");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::clock::ManualClock;
    use crate::ratelimit::RateLimitPolicies;

    const START: u64 = 1_700_000_000_000;

    fn fixture() -> (Arc<dyn CacheService>, RateLimiters, ManualClock) {
        let clock = ManualClock::new(START);
        let cache: Arc<dyn CacheService> =
            Arc::new(MemoryCache::with_clock(100, 300, clock.shared()));
        let limiters = RateLimiters::with_clock(RateLimitPolicies::default(), clock.shared());
        (cache, limiters, clock)
    }

    #[tokio::test]
    async fn test_cleanup_task_purges_expired_entries() {
        let (cache, limiters, clock) = fixture();
        cache.set("expire_soon", "value", Some(1)).await.unwrap();
        cache.set("long_lived", "value", Some(3600)).await.unwrap();
        clock.advance(Duration::from_secs(2));

        let handle = spawn_cleanup_task(cache.clone(), limiters, 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let stats = cache.stats().await;
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(cache.get("long_lived").await.unwrap().as_deref(), Some("value"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_sweeps_stale_counters() {
        let (cache, limiters, clock) = fixture();
        limiters.default.check("198.51.100.1");
        limiters.strict.check("198.51.100.1");
        clock.advance(Duration::from_secs(61));

        let handle = spawn_cleanup_task(cache, limiters.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(limiters.default.tracked_clients(), 0);
        assert_eq!(limiters.strict.tracked_clients(), 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let (cache, limiters, _clock) = fixture();

        let handle = spawn_cleanup_task(cache, limiters, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
