//! Per-call options for the manager's strategies.

use std::time::Duration;

use serde_json::Value;

use crate::cache::RawKey;

/// Default queue length that triggers an immediate write-behind drain.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default fraction of the TTL window after which refresh-ahead reloads.
pub const DEFAULT_REFRESH_THRESHOLD: f64 = 0.8;

/// TTL and namespace shared by every strategy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheOptions {
    /// Entry TTL; `None` falls back to the store's default
    pub ttl: Option<Duration>,
    pub namespace: Option<String>,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub(crate) fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteBehindOptions {
    pub cache: CacheOptions,
    /// Queue length at which an immediate drain is triggered
    pub batch_size: usize,
}

impl Default for WriteBehindOptions {
    fn default() -> Self {
        Self {
            cache: CacheOptions::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl From<CacheOptions> for WriteBehindOptions {
    fn from(cache: CacheOptions) -> Self {
        Self {
            cache,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshAheadOptions {
    pub cache: CacheOptions,
    /// Fraction of the TTL window (0.0..=1.0) after which a hit triggers a
    /// background reload
    pub refresh_threshold: f64,
}

impl Default for RefreshAheadOptions {
    fn default() -> Self {
        Self {
            cache: CacheOptions::default(),
            refresh_threshold: DEFAULT_REFRESH_THRESHOLD,
        }
    }
}

impl From<CacheOptions> for RefreshAheadOptions {
    fn from(cache: CacheOptions) -> Self {
        Self {
            cache,
            ..Self::default()
        }
    }
}

/// Store names and TTL for multi-tier reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub struct TierOptions {
    pub l1: String,
    pub l2: Option<String>,
    pub cache: CacheOptions,
}

impl TierOptions {
    pub fn new(l1: impl Into<String>, l2: impl Into<String>) -> Self {
        Self {
            l1: l1.into(),
            l2: Some(l2.into()),
            cache: CacheOptions::default(),
        }
    }

    pub fn l1_only(l1: impl Into<String>) -> Self {
        Self {
            l1: l1.into(),
            l2: None,
            cache: CacheOptions::default(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl = Some(ttl);
        self
    }
}

/// One entry for [`CacheManager::warm_cache`](crate::manager::CacheManager::warm_cache).
#[derive(Debug, Clone, PartialEq)]
pub struct WarmItem {
    pub key: RawKey,
    pub value: Value,
    pub ttl: Option<Duration>,
}

impl WarmItem {
    pub fn new(key: impl Into<RawKey>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
            ttl: None,
        }
    }
}
