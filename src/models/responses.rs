//! Response DTOs for the cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;
use crate::ratelimit::RateLimiter;

/// Response body for `GET /cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for `PUT /cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    pub key: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for `DELETE /cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub key: String,
    /// False when the key was already absent
    pub deleted: bool,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>, deleted: bool) -> Self {
        Self {
            key: key.into(),
            deleted,
        }
    }
}

/// Response body for `GET /cache/:key/exists`
#[derive(Debug, Clone, Serialize)]
pub struct ExistsResponse {
    pub key: String,
    pub exists: bool,
}

/// Response body for the TTL endpoints
#[derive(Debug, Clone, Serialize)]
pub struct TtlResponse {
    pub key: String,
    /// Seconds remaining, or -1 when the key is absent or never expires
    pub ttl: i64,
}

impl TtlResponse {
    pub fn new(key: impl Into<String>, ttl: Option<u64>) -> Self {
        Self {
            key: key.into(),
            ttl: ttl.map_or(-1, |secs| secs.min(i64::MAX as u64) as i64),
        }
    }
}

/// Response body for pattern and namespace clears
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub pattern: String,
    pub deleted: u64,
}

/// Quota and occupancy of one rate limit policy
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitSummary {
    pub policy: String,
    pub max: u32,
    pub window_ms: u64,
    pub tracked_clients: usize,
}

impl From<&RateLimiter> for RateLimitSummary {
    fn from(limiter: &RateLimiter) -> Self {
        let policy = limiter.policy();
        Self {
            policy: policy.name.to_string(),
            max: policy.max,
            window_ms: policy.window_ms(),
            tracked_clients: limiter.tracked_clients(),
        }
    }
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub backend: String,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub backend_errors: u64,
    pub total_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    pub rate_limits: Vec<RateLimitSummary>,
}

impl StatsResponse {
    pub fn new(backend: &str, stats: &CacheStats, rate_limits: Vec<RateLimitSummary>) -> Self {
        Self {
            backend: backend.to_string(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            backend_errors: stats.backend_errors,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
            rate_limits,
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy", or "degraded" when the cache store does not answer
    pub status: String,
    pub backend: String,
    /// Current timestamp in RFC 3339 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(backend: &str, store_ok: bool) -> Self {
        Self {
            status: if store_ok { "healthy" } else { "degraded" }.to_string(),
            backend: backend.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
