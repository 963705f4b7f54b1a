//! Cache Module
//!
//! A uniform [`CacheService`] over two backends: Redis for deployments that
//! share a cache between instances, and an in-process store used when Redis
//! is not configured or does not answer at startup. [`CacheFactory`] makes
//! that choice once.

mod entry;
mod factory;
mod keys;
mod lru;
mod memory;
mod pattern;
mod redis;
mod service;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use factory::{CacheConfig, CacheFactory};
pub use keys::CacheNamespace;
pub use memory::MemoryCache;
pub use pattern::{escape as escape_glob, GlobPattern};
pub use self::redis::RedisCache;
pub use service::{CacheExt, CacheService};
pub use stats::CacheStats;
pub use store::CacheStore;

use crate::error::{CacheError, Result};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Rejects keys and values every backend refuses to store.
pub fn validate_entry(key: &str, value: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if value.len() > MAX_VALUE_SIZE {
        return Err(CacheError::InvalidRequest(format!(
            "Value exceeds maximum size of {} bytes",
            MAX_VALUE_SIZE
        )));
    }
    Ok(())
}
