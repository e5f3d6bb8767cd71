//! Tiered Cache - A bounded multi-tier in-memory caching engine
//!
//! Named stores with TTL expiration and LRU eviction, exposed through
//! cache-aside, write-through, write-behind and refresh-ahead strategies,
//! with L1/L2 promotion and a batched write-behind queue.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod tasks;
pub mod write_behind;

pub use api::AppState;
pub use cache::{CacheKey, CacheStats, RawKey, StoreHandle};
pub use config::{Config, StoreConfig, WriteBehindConfig};
pub use error::{CacheError, Result};
pub use manager::{
    CacheManager, CacheOptions, RefreshAheadOptions, TierOptions, WarmItem, WriteBehindOptions,
    DEFAULT_STORE,
};
pub use write_behind::{persist_fn, DrainReport, PersistFn};
