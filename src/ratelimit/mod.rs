//! Rate Limiting Module
//!
//! Fixed-window admission control keyed by client address, with the named
//! policies `default`, `strict` and `admin` on independent counter maps.

mod limiter;
mod middleware;
mod policy;

pub use limiter::{
    RateLimitCounter, RateLimitDecision, RateLimitStatus, RateLimiter, RateLimiters,
};
pub use middleware::{
    client_key, rate_limit, RateLimitRejection, RateLimitState, X_RATELIMIT_LIMIT,
    X_RATELIMIT_REMAINING, X_RATELIMIT_RESET,
};
pub use policy::{RateLimitPolicies, RateLimitPolicy};
