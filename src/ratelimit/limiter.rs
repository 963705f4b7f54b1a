//! Fixed-window request counter.
//!
//! Windows are wall-clock based and reset fully, so a client can spend its
//! whole quota just before a reset and again just after it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::clock::{system_clock, SharedClock};
use crate::ratelimit::{RateLimitPolicies, RateLimitPolicy};

/// Per-client state inside the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitCounter {
    pub count: u32,
    /// Unix milliseconds at which the window ends
    pub window_reset_at: u64,
}

/// Quota figures reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    /// Unix milliseconds at which the window ends
    pub reset_at_ms: u64,
    /// Whole seconds until the window ends, at least 1
    pub retry_after_secs: u64,
}

impl RateLimitStatus {
    /// Window end in Unix seconds, rounded up.
    pub fn reset_at_secs(&self) -> u64 {
        self.reset_at_ms.div_ceil(1000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed(RateLimitStatus),
    Rejected(RateLimitStatus),
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed(_))
    }

    pub fn status(&self) -> &RateLimitStatus {
        match self {
            RateLimitDecision::Allowed(status) | RateLimitDecision::Rejected(status) => status,
        }
    }
}

// == Rate Limiter ==
/// Counts requests per client key under one [`RateLimitPolicy`].
#[derive(Debug)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    counters: Mutex<HashMap<String, RateLimitCounter>>,
    clock: SharedClock,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self::with_clock(policy, system_clock())
    }

    pub fn with_clock(policy: RateLimitPolicy, clock: SharedClock) -> Self {
        Self {
            policy,
            counters: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    // == Check ==
    /// Records a request from `client_key` and decides whether to admit it.
    ///
    /// Rejected requests do not advance the counter.
    pub fn check(&self, client_key: &str) -> RateLimitDecision {
        let now = self.clock.now_ms();
        let max = self.policy.max;

        // Poisoned lock: keep counting on the inner map
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let counter = counters
            .entry(client_key.to_string())
            .or_insert(RateLimitCounter {
                count: 0,
                window_reset_at: 0,
            });

        let admitted = if now >= counter.window_reset_at {
            counter.count = 1;
            counter.window_reset_at = now.saturating_add(self.policy.window_ms());
            counter.count <= max
        } else if counter.count >= max {
            false
        } else {
            counter.count += 1;
            true
        };

        let status = RateLimitStatus {
            limit: max,
            remaining: max.saturating_sub(counter.count),
            reset_at_ms: counter.window_reset_at,
            retry_after_secs: counter.window_reset_at.saturating_sub(now).div_ceil(1000).max(1),
        };

        if admitted {
            RateLimitDecision::Allowed(status)
        } else {
            debug!(
                policy = self.policy.name,
                client = client_key,
                retry_after = status.retry_after_secs,
                "rate limit exceeded"
            );
            RateLimitDecision::Rejected(status)
        }
    }

    // == Sweep ==
    /// Forgets clients whose window has ended. Returns how many were dropped.
    pub fn sweep_stale(&self) -> usize {
        let now = self.clock.now_ms();
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let before = counters.len();
        counters.retain(|_, counter| counter.window_reset_at > now);
        before - counters.len()
    }

    /// Number of clients with a counter in memory.
    pub fn tracked_clients(&self) -> usize {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

// == Rate Limiters ==
/// One independent limiter per named policy.
#[derive(Debug, Clone)]
pub struct RateLimiters {
    pub default: Arc<RateLimiter>,
    pub strict: Arc<RateLimiter>,
    pub admin: Arc<RateLimiter>,
}

impl RateLimiters {
    pub fn new(policies: RateLimitPolicies) -> Self {
        Self::with_clock(policies, system_clock())
    }

    pub fn with_clock(policies: RateLimitPolicies, clock: SharedClock) -> Self {
        Self {
            default: Arc::new(RateLimiter::with_clock(policies.default, clock.clone())),
            strict: Arc::new(RateLimiter::with_clock(policies.strict, clock.clone())),
            admin: Arc::new(RateLimiter::with_clock(policies.admin, clock)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RateLimiter>> {
        [&self.default, &self.strict, &self.admin].into_iter()
    }

    /// Sweeps every policy. Returns the total number of counters dropped.
    pub fn sweep_stale(&self) -> usize {
        self.iter().map(|limiter| limiter.sweep_stale()).sum()
    }
}
