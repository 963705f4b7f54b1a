//! Cache Store Module
//!
//! Synchronous in-memory engine behind the memory backend: a HashMap of
//! entries plus LRU order, TTL expiry and statistics.

use std::collections::HashMap;

use crate::cache::lru::LruTracker;
use crate::cache::{validate_entry, CacheEntry, CacheStats, GlobPattern};
use crate::clock::{system_clock, SharedClock};
use crate::error::Result;

// == Cache Store ==
/// In-memory key-value storage with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    stats: CacheStats,
    max_entries: usize,
    /// TTL in seconds for entries stored without one
    default_ttl: u64,
    clock: SharedClock,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store on the system clock.
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self::with_clock(max_entries, default_ttl, system_clock())
    }

    /// Creates a store on an explicit clock.
    pub fn with_clock(max_entries: usize, default_ttl: u64, clock: SharedClock) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries: max_entries.max(1),
            default_ttl: default_ttl.max(1),
            clock,
        }
    }

    // == Set ==
    /// Stores a value, replacing any previous entry and its TTL.
    ///
    /// `ttl` of `None` uses the default TTL; zero is raised to one second.
    /// At capacity, the least recently used entry makes room.
    pub fn set(&mut self, key: String, value: String, ttl: Option<u64>) -> Result<()> {
        validate_entry(&key, &value)?;

        let now = self.clock.now_ms();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.make_room(now);
        }

        let ttl = ttl.unwrap_or(self.default_ttl).max(1);
        self.entries
            .insert(key.clone(), CacheEntry::new(value, now, Some(ttl)));
        self.lru.touch(&key);
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Get ==
    /// Returns the value if present and unexpired. Expired entries are
    /// dropped on the way.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let now = self.clock.now_ms();
        match self.live_entry(key, now) {
            Some(entry) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                self.lru.touch(key);
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes an entry. Returns false if there was nothing to remove.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Exists ==
    pub fn exists(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.live_entry(key, now).is_some()
    }

    // == Clear Pattern ==
    /// Removes every key matching `pattern`, returning how many went.
    pub fn clear_pattern(&mut self, pattern: &GlobPattern) -> usize {
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();

        for key in &matching {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.set_total_entries(self.entries.len());
        matching.len()
    }

    // == TTL ==
    /// Seconds left before `key` expires; None when absent or never expiring.
    pub fn ttl(&mut self, key: &str) -> Option<u64> {
        let now = self.clock.now_ms();
        self.live_entry(key, now)?.ttl_remaining(now)
    }

    /// Gives an existing entry a fresh TTL. Returns false when absent.
    pub fn update_ttl(&mut self, key: &str, ttl: u64) -> bool {
        let now = self.clock.now_ms();
        if self.live_entry(key, now).is_none() {
            return false;
        }
        if let Some(entry) = self.entries.get_mut(key) {
            entry.expire_in(now, ttl.max(1));
        }
        true
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_expirations(expired.len());
        self.stats.set_total_entries(self.entries.len());
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry, dropping it first if it has expired.
    fn live_entry(&mut self, key: &str, now: u64) -> Option<&CacheEntry> {
        if self.entries.get(key)?.is_expired_at(now) {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
            return None;
        }
        self.entries.get(key)
    }

    /// Frees a slot, preferring expired entries over live ones.
    fn make_room(&mut self, now: u64) {
        if self.cleanup_expired() > 0 {
            return;
        }
        while let Some(oldest) = self.lru.evict_oldest() {
            if self.entries.remove(&oldest).is_some() {
                self.stats.record_eviction();
                tracing::debug!(key = %oldest, now, "evicted least recently used entry");
                return;
            }
        }
    }
}
