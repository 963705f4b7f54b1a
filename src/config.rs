//! Configuration Module
//!
//! Loads server, cache and rate limit settings from environment variables.
//!
//! # Environment Variables
//! - `SERVER_PORT` - HTTP server port (default: 3000)
//! - `DEFAULT_TTL` - TTL in seconds for entries stored without one (default: 300)
//! - `MAX_ENTRIES` - Capacity of the in-memory backend (default: 10000)
//! - `CLEANUP_INTERVAL` - Seconds between expiry/counter sweeps (default: 30)
//! - `REDIS_URL` - Redis connection string; unset means memory only
//! - `REDIS_PROBE_TIMEOUT_MS` - Startup probe timeout (default: 500)
//! - `CACHE_KEY_PREFIX` - Namespace for Redis keys (default: `studybridge:`)
//! - `BEHIND_PROXY` - Trust `X-Forwarded-For` / `X-Real-IP` (default: false)
//! - `RATE_LIMIT_{DEFAULT,STRICT,ADMIN}_MAX` - Requests per window
//! - `RATE_LIMIT_{DEFAULT,STRICT,ADMIN}_WINDOW_MS` - Window length

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::ratelimit::{RateLimitPolicies, RateLimitPolicy};

/// Server configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in seconds
    pub cleanup_interval: u64,
    /// Trust proxy headers for client identity
    pub behind_proxy: bool,
    pub cache: CacheConfig,
    pub rate_limits: RateLimitPolicies,
}

impl Config {
    /// Creates a Config from environment variables, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let redis_url = env::var("REDIS_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Self {
            server_port: parse_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: parse_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            behind_proxy: env::var("BEHIND_PROXY")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.behind_proxy),
            cache: CacheConfig {
                redis_url,
                probe_timeout: Duration::from_millis(parse_or(
                    "REDIS_PROBE_TIMEOUT_MS",
                    defaults.cache.probe_timeout.as_millis() as u64,
                )),
                key_prefix: env::var("CACHE_KEY_PREFIX").unwrap_or(defaults.cache.key_prefix),
                default_ttl: parse_or("DEFAULT_TTL", defaults.cache.default_ttl),
                max_entries: parse_or("MAX_ENTRIES", defaults.cache.max_entries),
            },
            rate_limits: RateLimitPolicies {
                default: policy_from_env("DEFAULT", defaults.rate_limits.default),
                strict: policy_from_env("STRICT", defaults.rate_limits.strict),
                admin: policy_from_env("ADMIN", defaults.rate_limits.admin),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 30,
            behind_proxy: false,
            cache: CacheConfig::default(),
            rate_limits: RateLimitPolicies::default(),
        }
    }
}

fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn policy_from_env(suffix: &str, default: RateLimitPolicy) -> RateLimitPolicy {
    let max = parse_or(&format!("RATE_LIMIT_{suffix}_MAX"), default.max);
    let window_ms = parse_or(&format!("RATE_LIMIT_{suffix}_WINDOW_MS"), default.window_ms());
    RateLimitPolicy::new(default.name, max, Duration::from_millis(window_ms.max(1)))
}
