//! StudyBridge cache - tiered caching and rate limiting for the StudyBridge API
//!
//! Serves cache reads and writes from Redis when it is reachable at startup
//! and from a bounded in-process store otherwise, behind fixed-window rate
//! limits keyed by client address.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod ratelimit;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{CacheExt, CacheFactory, CacheNamespace, CacheService};
pub use config::Config;
pub use error::{CacheError, Result};
pub use ratelimit::{RateLimitPolicy, RateLimiter, RateLimiters};
pub use tasks::spawn_cleanup_task;
