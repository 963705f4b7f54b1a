//! Redis-backed cache implementation.
//!
//! Uses `redis::aio::ConnectionManager` for multiplexed connections with
//! automatic reconnection. Pattern deletes walk the keyspace with SCAN so the
//! server is never blocked by KEYS.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client, RedisError};
use tracing::{debug, info, warn};

use crate::cache::{validate_entry, CacheService, CacheStats, GlobPattern};
use crate::error::{CacheError, Result};

/// Keys fetched per SCAN round trip.
const SCAN_BATCH: usize = 100;

/// Redis cache shared by every StudyBridge instance.
///
/// All request-path operations are fail-open: command errors are logged,
/// counted in [`CacheStats::backend_errors`] and reported as a miss or a
/// no-op.
pub struct RedisCache {
    conn: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
    stats: Mutex<CacheStats>,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("conn", &"ConnectionManager")
            .field("default_ttl", &self.default_ttl)
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - connection string, e.g. `redis://localhost:6379/0`
    /// - `default_ttl` - seconds applied when `set` gets no TTL
    /// - `key_prefix` - namespace prepended to every key
    ///
    /// # Errors
    ///
    /// [`CacheError::Unavailable`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str, default_ttl: u64, key_prefix: &str) -> Result<Self> {
        info!(url = %redact_url(redis_url), "Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::Unavailable(format!("Failed to create Redis client: {}", e))
        })?;

        let mut conn = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::Unavailable(format!("Failed to connect to Redis: {}", e))
        })?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Unavailable(format!("Redis PING failed: {}", e)))?;
        if pong != "PONG" {
            return Err(CacheError::Unavailable(format!(
                "Unexpected PING reply: {pong}"
            )));
        }

        info!("Connected to Redis");

        Ok(Self {
            conn,
            default_ttl: default_ttl.max(1),
            key_prefix: key_prefix.to_string(),
            stats: Mutex::new(CacheStats::new()),
        })
    }

    fn build_key(&self, key: &str) -> String {
        namespaced(&self.key_prefix, key)
    }

    fn record(&self, f: impl FnOnce(&mut CacheStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut stats);
    }

    /// Logs a swallowed store failure and hands back the degraded result.
    fn degrade<T>(&self, op: &'static str, key: &str, err: RedisError, fallback: T) -> T {
        warn!(op, key, error = %err, "Redis command failed, degrading");
        self.record(CacheStats::record_backend_error);
        fallback
    }

    async fn scan_and_delete(&self, pattern: &str) -> std::result::Result<u64, (u64, RedisError)> {
        let mut conn = self.conn.clone();
        let mut deleted: u64 = 0;
        let mut cursor: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| (deleted, e))?;

            if !keys.is_empty() {
                let count: u64 = redis::cmd("DEL")
                    .arg(&keys)
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| (deleted, e))?;
                deleted += count;
            }

            cursor = next_cursor;
            if cursor == 0 {
                return Ok(deleted);
            }
        }
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let result = redis::cmd("GET")
            .arg(self.build_key(key))
            .query_async::<Option<String>>(&mut conn)
            .await;

        match result {
            Ok(Some(value)) => {
                debug!(key, "Cache HIT");
                self.record(CacheStats::record_hit);
                Ok(Some(value))
            }
            Ok(None) => {
                debug!(key, "Cache MISS");
                self.record(CacheStats::record_miss);
                Ok(None)
            }
            Err(e) => {
                self.record(CacheStats::record_miss);
                Ok(self.degrade("GET", key, e, None))
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<()> {
        validate_entry(key, value)?;
        let ttl = ttl_seconds.unwrap_or(self.default_ttl).max(1);
        let mut conn = self.conn.clone();

        let result = redis::cmd("SET")
            .arg(self.build_key(key))
            .arg(value)
            .arg("EX")
            .arg(ttl)
            .query_async::<()>(&mut conn)
            .await;

        match result {
            Ok(()) => {
                debug!(key, ttl, "Cache SET");
                Ok(())
            }
            Err(e) => Ok(self.degrade("SET", key, e, ())),
        }
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let result = redis::cmd("DEL")
            .arg(self.build_key(key))
            .query_async::<i64>(&mut conn)
            .await;

        match result {
            Ok(deleted) => Ok(deleted > 0),
            Err(e) => Ok(self.degrade("DEL", key, e, false)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let result = redis::cmd("EXISTS")
            .arg(self.build_key(key))
            .query_async::<i64>(&mut conn)
            .await;

        match result {
            Ok(count) => Ok(count > 0),
            Err(e) => Ok(self.degrade("EXISTS", key, e, false)),
        }
    }

    async fn clear_pattern(&self, pattern: &str) -> Result<u64> {
        let glob = GlobPattern::parse(pattern)?;
        let scoped = glob.with_prefix(&self.key_prefix);

        match self.scan_and_delete(&scoped).await {
            Ok(deleted) => {
                debug!(pattern, deleted, "Cache pattern DEL");
                Ok(deleted)
            }
            Err((deleted, e)) => Ok(self.degrade("SCAN/DEL", pattern, e, deleted)),
        }
    }

    async fn get_ttl(&self, key: &str) -> Result<Option<u64>> {
        let mut conn = self.conn.clone();
        let result = redis::cmd("TTL")
            .arg(self.build_key(key))
            .query_async::<i64>(&mut conn)
            .await;

        // -2: no such key, -1: no expiry
        match result {
            Ok(secs) if secs >= 0 => Ok(Some(secs as u64)),
            Ok(_) => Ok(None),
            Err(e) => Ok(self.degrade("TTL", key, e, None)),
        }
    }

    async fn update_ttl(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        let mut conn = self.conn.clone();
        let result = redis::cmd("EXPIRE")
            .arg(self.build_key(key))
            .arg(ttl_seconds.max(1))
            .query_async::<i64>(&mut conn)
            .await;

        match result {
            Ok(updated) => Ok(updated == 1),
            Err(e) => Ok(self.degrade("EXPIRE", key, e, false)),
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        matches!(
            redis::cmd("PING").query_async::<String>(&mut conn).await,
            Ok(pong) if pong == "PONG"
        )
    }

    /// `total_entries` is the DBSIZE of the logical database, which may
    /// include keys outside this instance's prefix.
    async fn stats(&self) -> CacheStats {
        let mut conn = self.conn.clone();
        let size = redis::cmd("DBSIZE").query_async::<u64>(&mut conn).await;

        let mut stats = self
            .stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match size {
            Ok(size) => stats.set_total_entries(size as usize),
            Err(e) => warn!(error = %e, "Redis DBSIZE failed"),
        }
        stats
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

/// Prepends the namespace prefix to a key.
fn namespaced(prefix: &str, key: &str) -> String {
    format!("{prefix}{key}")
}

/// Redacts the password from a Redis URL for logging.
fn redact_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            // redis://host@... has no credentials after the scheme colon
            if url[..colon_pos].contains("//") {
                return format!("{}***{}", &url[..=colon_pos], &url[at_pos..]);
            }
        }
    }
    url.to_string()
}
