//! Multi-tier (L1/L2) reads and writes.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::{CacheManager, TierOptions};
use crate::cache::{CacheKey, RawKey};

impl CacheManager {
    // == Multi-Tier Get ==
    /// Reads L1, then L2. An L2 hit is promoted into L1 before returning.
    ///
    /// The promoted copy never outlives the L2 entry it came from.
    pub async fn multi_tier_get(&self, key: impl Into<RawKey>, opts: &TierOptions) -> Option<Value> {
        let key = CacheKey::new(opts.cache.namespace(), key);
        let l1 = self.get_cache(&opts.l1);

        if let Some(value) = l1.get_key(&key).await {
            return Some(value);
        }

        let l2 = self.get_cache(opts.l2.as_deref()?);
        let entry = l2.get_entry(&key).await?;

        let requested = match opts.cache.ttl {
            Some(ttl) => Some(ttl),
            None => l1.default_ttl().await,
        };
        let remaining = entry.ttl_remaining_ms().map(Duration::from_millis);
        let ttl = promotion_ttl(requested, remaining);

        l1.set_key(key.clone(), entry.value.clone(), ttl).await;
        debug!(
            key = %key,
            l1 = l1.name(),
            l2 = l2.name(),
            ttl_ms = ttl.map(|t| t.as_millis() as u64),
            "promoted L2 hit into L1"
        );
        Some(entry.value)
    }

    // == Multi-Tier Set ==
    /// Writes L1 with the given TTL and, if configured, L2 with twice that
    /// TTL. Without a TTL each tier uses its own default.
    pub async fn multi_tier_set(&self, key: impl Into<RawKey>, value: Value, opts: &TierOptions) {
        let key = CacheKey::new(opts.cache.namespace(), key);

        if let Some(l2) = opts.l2.as_deref() {
            let l2_ttl = opts.cache.ttl.map(|ttl| ttl.saturating_mul(2));
            self.get_cache(l2).set_key(key.clone(), value.clone(), l2_ttl).await;
        }

        self.get_cache(&opts.l1).set_key(key, value, opts.cache.ttl).await;
    }
}

/// The shorter of the requested L1 TTL and what is left of the L2 entry.
fn promotion_ttl(requested: Option<Duration>, remaining: Option<Duration>) -> Option<Duration> {
    match (requested, remaining) {
        (Some(requested), Some(remaining)) => Some(requested.min(remaining)),
        (requested, None) => requested,
        (None, remaining) => remaining,
    }
}
