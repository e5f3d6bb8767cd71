//! Cache Module
//!
//! Provides single-tier in-memory caching with TTL expiration and LRU
//! eviction, and the shareable handle the manager hands out.

mod entry;
mod handle;
mod key;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use handle::StoreHandle;
pub use key::{CacheKey, RawKey};
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::{CacheStore, SetOutcome};
