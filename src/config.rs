//! Configuration Module
//!
//! Handles loading store, write-behind and server configuration from
//! environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Per-store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of entries the store can hold
    pub capacity: usize,
    /// TTL applied when `set` is called without one; `None` = no expiry
    pub default_ttl: Option<Duration>,
    /// Interval between expiry sweeps; `None` = lazy expiry only
    pub cleanup_interval: Option<Duration>,
}

impl StoreConfig {
    /// Creates a store config with no default TTL and no sweeper.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            default_ttl: None,
            cleanup_interval: None,
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Rejects a zero capacity or a zero sweep interval.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }
        if self.cleanup_interval == Some(Duration::ZERO) {
            return Err(CacheError::InvalidConfig(
                "cleanup interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            default_ttl: Some(Duration::from_millis(300_000)),
            cleanup_interval: Some(Duration::from_millis(60_000)),
        }
    }
}

/// Write-behind queue tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBehindConfig {
    /// Maximum number of items persisted per drain
    pub batch_size: usize,
    /// Attempts after the first before an item is abandoned
    pub max_retries: u32,
    /// Interval of the background drain; `None` = size-triggered drains only
    pub drain_interval: Option<Duration>,
}

impl WriteBehindConfig {
    /// Rejects a zero batch size or a zero drain interval.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(CacheError::InvalidConfig(
                "write-behind batch size must be greater than zero".to_string(),
            ));
        }
        if self.drain_interval == Some(Duration::ZERO) {
            return Err(CacheError::InvalidConfig(
                "write-behind drain interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for WriteBehindConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_retries: 3,
            drain_interval: Some(Duration::from_millis(5_000)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Configuration of the default store
    pub default_store: StoreConfig,
    /// Write-behind queue tuning
    pub write_behind: WriteBehindConfig,
    /// TTL for cached `/stats` responses; `None` disables the response cache
    pub response_cache_ttl: Option<Duration>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_CAPACITY` - Default store capacity (default: 1000)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in ms, or `none` (default: 300000)
    /// - `CACHE_CLEANUP_INTERVAL_MS` - Sweep interval in ms, or `none` (default: 60000)
    /// - `WRITE_BEHIND_BATCH_SIZE` - Items per drain (default: 10)
    /// - `WRITE_BEHIND_MAX_RETRIES` - Retry ceiling (default: 3)
    /// - `WRITE_BEHIND_INTERVAL_MS` - Background drain interval in ms, or `none` (default: 5000)
    /// - `RESPONSE_CACHE_TTL_MS` - TTL for cached `/stats` responses in ms, or `none` (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            default_store: StoreConfig {
                capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.default_store.capacity),
                default_ttl: optional_millis("CACHE_DEFAULT_TTL_MS")
                    .unwrap_or(defaults.default_store.default_ttl),
                cleanup_interval: optional_millis("CACHE_CLEANUP_INTERVAL_MS")
                    .unwrap_or(defaults.default_store.cleanup_interval),
            },
            write_behind: WriteBehindConfig {
                batch_size: parse_var("WRITE_BEHIND_BATCH_SIZE")
                    .unwrap_or(defaults.write_behind.batch_size),
                max_retries: parse_var("WRITE_BEHIND_MAX_RETRIES")
                    .unwrap_or(defaults.write_behind.max_retries),
                drain_interval: optional_millis("WRITE_BEHIND_INTERVAL_MS")
                    .unwrap_or(defaults.write_behind.drain_interval),
            },
            response_cache_ttl: optional_millis("RESPONSE_CACHE_TTL_MS")
                .unwrap_or(defaults.response_cache_ttl),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_store: StoreConfig::default(),
            write_behind: WriteBehindConfig::default(),
            response_cache_ttl: Some(Duration::from_millis(1_000)),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Reads a millisecond duration where `none` means "disabled".
///
/// Returns `None` when the variable is unset or unparsable so the caller
/// falls back to its default.
fn optional_millis(name: &str) -> Option<Option<Duration>> {
    let raw = env::var(name).ok()?;
    if raw.trim().eq_ignore_ascii_case("none") {
        return Some(None);
    }
    raw.trim().parse().ok().map(|ms| Some(Duration::from_millis(ms)))
}
