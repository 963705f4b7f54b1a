//! Named rate limit policies.

use std::time::Duration;

/// Quota for one class of routes: at most `max` requests per client per
/// fixed `window`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub name: &'static str,
    pub max: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(name: &'static str, max: u32, window: Duration) -> Self {
        Self { name, max, window }
    }

    /// Public read traffic: 100 requests per minute.
    pub fn standard() -> Self {
        Self::new("default", 100, Duration::from_secs(60))
    }

    /// Expensive or destructive operations: 10 requests per minute.
    pub fn strict() -> Self {
        Self::new("strict", 10, Duration::from_secs(60))
    }

    /// Admin writes: 1000 requests per minute.
    pub fn admin() -> Self {
        Self::new("admin", 1000, Duration::from_secs(60))
    }

    /// Window length in milliseconds, saturating at `u64::MAX`.
    pub fn window_ms(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX)
    }
}

/// The three policies the router applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicies {
    pub default: RateLimitPolicy,
    pub strict: RateLimitPolicy,
    pub admin: RateLimitPolicy,
}

impl Default for RateLimitPolicies {
    fn default() -> Self {
        Self {
            default: RateLimitPolicy::standard(),
            strict: RateLimitPolicy::strict(),
            admin: RateLimitPolicy::admin(),
        }
    }
}
