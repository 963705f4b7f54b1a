//! Cache Entry Module
//!
//! A single stored value with its expiry, evaluated against a caller-supplied
//! timestamp so the store decides which clock is authoritative.

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Serialized JSON payload
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry at `now_ms` that expires `ttl_seconds` later.
    pub fn new(value: String, now_ms: u64, ttl_seconds: Option<u64>) -> Self {
        Self {
            value,
            created_at: now_ms,
            expires_at: ttl_seconds.map(|ttl| expiry_from(now_ms, ttl)),
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now_ms` reaches its expiration time.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        matches!(self.expires_at, Some(expires) if now_ms >= expires)
    }

    // == Time To Live ==
    /// Remaining lifetime in milliseconds, or None when the entry never expires.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(now_ms))
    }

    /// Remaining lifetime in whole seconds, rounded up so a live entry never
    /// reports zero.
    pub fn ttl_remaining(&self, now_ms: u64) -> Option<u64> {
        self.ttl_remaining_ms(now_ms).map(|ms| ms.div_ceil(1000))
    }

    // == Update Expiry ==
    /// Replaces the expiry without touching the value.
    pub fn expire_in(&mut self, now_ms: u64, ttl_seconds: u64) {
        self.expires_at = Some(expiry_from(now_ms, ttl_seconds));
    }
}

fn expiry_from(now_ms: u64, ttl_seconds: u64) -> u64 {
    now_ms.saturating_add(ttl_seconds.saturating_mul(1000))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000_000;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new("\"v\"".to_string(), NOW, None);

        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired_at(u64::MAX));
        assert!(entry.ttl_remaining(NOW).is_none());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("1".to_string(), NOW, Some(1));

        assert!(!entry.is_expired_at(NOW + 999));
        assert!(entry.is_expired_at(NOW + 1_000));
    }

    #[test]
    fn test_ttl_remaining_rounds_up() {
        let entry = CacheEntry::new("1".to_string(), NOW, Some(10));

        assert_eq!(entry.ttl_remaining(NOW), Some(10));
        assert_eq!(entry.ttl_remaining(NOW + 9_001), Some(1));
        assert_eq!(entry.ttl_remaining_ms(NOW + 20_000), Some(0));
    }

    #[test]
    fn test_expire_in_keeps_value() {
        let mut entry = CacheEntry::new("payload".to_string(), NOW, Some(5));
        entry.expire_in(NOW + 1_000, 60);

        assert_eq!(entry.value, "payload");
        assert_eq!(entry.expires_at, Some(NOW + 61_000));
        assert_eq!(entry.created_at, NOW);
    }
}
