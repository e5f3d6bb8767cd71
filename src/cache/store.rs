//! Cache Store Module
//!
//! Single-tier cache engine combining HashMap storage with LRU tracking and
//! TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheKey, CacheStats, LruTracker};
use crate::config::StoreConfig;

// == Set Outcome ==
/// What a `set` did besides storing the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOutcome {
    /// Key evicted to make room, if the store was full
    pub evicted: Option<CacheKey>,
    /// True if an existing entry was overwritten
    pub replaced: bool,
}

// == Cache Store ==
/// Bounded cache storage with LRU eviction and TTL support.
///
/// `len() <= capacity()` holds after every operation.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<CacheKey, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// TTL for entries stored without an explicit one
    default_ttl: Option<Duration>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize, default_ttl: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            capacity: capacity.max(1),
            default_ttl,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.capacity, config.default_ttl)
    }

    // == Set ==
    /// Stores a value, resetting its TTL.
    ///
    /// An existing key is overwritten in place. A new key arriving at capacity
    /// first evicts the least recently used entry.
    pub fn set(&mut self, key: CacheKey, value: Value, ttl: Option<Duration>) -> SetOutcome {
        let replaced = self.entries.contains_key(&key);
        let mut evicted = None;

        if !replaced && self.entries.len() >= self.capacity {
            if let Some(victim) = self.lru.evict_oldest() {
                self.entries.remove(&victim);
                self.stats.record_eviction();
                debug!(key = %victim, "evicted least recently used entry");
                evicted = Some(victim);
            }
        }

        let entry = CacheEntry::new(value, ttl.or(self.default_ttl));
        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);
        self.stats.record_set();

        SetOutcome { evicted, replaced }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &CacheKey) -> Option<Value> {
        self.get_entry(key).map(|entry| entry.value)
    }

    /// Like `get`, but returns the entry with its timestamps.
    pub fn get_entry(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let now = current_timestamp_ms();

        match self.entries.get_mut(key) {
            Some(entry) if entry.is_expired_at(now) => {
                self.entries.remove(key);
                self.lru.remove(key);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                None
            }
            Some(entry) => {
                entry.touch_at(now);
                let entry = entry.clone();
                self.lru.touch(key);
                self.stats.record_hit();
                Some(entry)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Reads a live entry without touching recency or stats.
    pub fn peek(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key).filter(|entry| !entry.is_expired())
    }

    // == Delete ==
    /// Removes an entry by key, returning true if one was present.
    pub fn delete(&mut self, key: &CacheKey) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            self.stats.record_delete();
            true
        } else {
            false
        }
    }

    // == Sweep Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_expirations(expired_keys.len());
        expired_keys.len()
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    // == Length ==
    /// Returns the number of resident entries, including expired ones not
    /// yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
