//! Read/write consistency strategies.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::{CacheManager, CacheOptions, RefreshAheadOptions, WriteBehindOptions};
use crate::cache::{CacheEntry, CacheKey, RawKey, StoreHandle};
use crate::error::{CacheError, Result};
use crate::write_behind::{PersistFn, WriteBehindItem};

type RefreshSet = Arc<Mutex<std::collections::HashSet<(String, CacheKey)>>>;

/// Releases a refresh claim when the background reload ends.
struct RefreshClaim {
    set: RefreshSet,
    id: (String, CacheKey),
}

impl Drop for RefreshClaim {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl CacheManager {
    // == Cache-Aside ==
    /// Returns the cached value, or loads, caches and returns it on a miss.
    ///
    /// `loader` runs at most once. `None` or JSON `null` results are returned
    /// but not cached. A loader error propagates and leaves the store as it
    /// was.
    pub async fn cache_aside<F, Fut>(
        &self,
        store: &str,
        key: impl Into<RawKey>,
        loader: F,
        opts: &CacheOptions,
    ) -> Result<Option<Value>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<Value>>>,
    {
        let handle = self.get_cache(store);
        let key = CacheKey::new(opts.namespace(), key);

        if let Some(value) = handle.get_key(&key).await {
            return Ok(Some(value));
        }

        load_and_store(&handle, key, loader, opts.ttl).await
    }

    // == Write-Through ==
    /// Persists `value`, then caches it.
    ///
    /// If `persist` fails the store is untouched and the error is returned,
    /// so the cache never holds a value ahead of durable state.
    pub async fn write_through<F, Fut>(
        &self,
        store: &str,
        key: impl Into<RawKey>,
        value: Value,
        persist: F,
        opts: &CacheOptions,
    ) -> Result<Value>
    where
        F: FnOnce(Value) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let handle = self.get_cache(store);
        let key = CacheKey::new(opts.namespace(), key);

        persist(value.clone()).await.map_err(CacheError::Persist)?;
        handle.set_key(key, value.clone(), opts.ttl).await;

        Ok(value)
    }

    // == Write-Behind ==
    /// Caches `value` immediately and queues `persist` for later.
    ///
    /// The value is visible to readers before it is durable. Persistence is
    /// best effort: failures are retried in the background and never reported
    /// here, and queued updates are lost if the process exits before a drain.
    pub async fn write_behind(
        &self,
        store: &str,
        key: impl Into<RawKey>,
        value: Value,
        persist: PersistFn,
        opts: &WriteBehindOptions,
    ) -> Value {
        let handle = self.get_cache(store);
        let key = CacheKey::new(opts.cache.namespace(), key);

        handle.set_key(key.clone(), value.clone(), opts.cache.ttl).await;
        let queued = self
            .write_behind
            .push(WriteBehindItem::new(key, value.clone(), persist));

        if queued >= opts.batch_size.max(1) {
            debug!(queued, "write-behind batch size reached, draining");
            let queue = self.write_behind.clone();
            tokio::spawn(async move {
                queue.drain().await;
            });
        }

        value
    }

    // == Refresh-Ahead ==
    /// Returns the cached value, reloading it in the background once it has
    /// used up `refresh_threshold` of its TTL window.
    ///
    /// The caller never waits for a background reload. A miss falls back to a
    /// synchronous cache-aside load.
    pub async fn refresh_ahead<F, Fut>(
        &self,
        store: &str,
        key: impl Into<RawKey>,
        loader: F,
        opts: &RefreshAheadOptions,
    ) -> Result<Option<Value>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<Option<Value>>> + Send + 'static,
    {
        let handle = self.get_cache(store);
        let key = CacheKey::new(opts.cache.namespace(), key);

        let Some(entry) = handle.get_entry(&key).await else {
            return load_and_store(&handle, key, loader, opts.cache.ttl).await;
        };

        if needs_refresh(&entry, opts.refresh_threshold) {
            self.spawn_refresh(handle, key, loader, opts.cache.ttl);
        }

        Ok(Some(entry.value))
    }

    fn spawn_refresh<F, Fut>(
        &self,
        handle: StoreHandle,
        key: CacheKey,
        loader: F,
        ttl: Option<Duration>,
    ) where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<Option<Value>>> + Send + 'static,
    {
        let id = (handle.name().to_string(), key.clone());
        let claimed = self
            .refreshing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone());
        if !claimed {
            return;
        }

        let claim = RefreshClaim {
            set: self.refreshing.clone(),
            id,
        };

        tokio::spawn(async move {
            let _claim = claim;
            match loader().await {
                Ok(Some(value)) if !value.is_null() => {
                    handle.set_key(key.clone(), value, ttl).await;
                    debug!(store = handle.name(), key = %key, "refresh-ahead reloaded entry");
                }
                Ok(_) => {
                    debug!(store = handle.name(), key = %key, "refresh-ahead loader returned nothing");
                }
                Err(err) => {
                    warn!(store = handle.name(), key = %key, error = %err, "refresh-ahead reload failed");
                }
            }
        });
    }
}

/// True once the entry's age passes `threshold` of its TTL window.
fn needs_refresh(entry: &CacheEntry, threshold: f64) -> bool {
    match entry.ttl_window_ms() {
        Some(window) if window > 0 => entry.age_ms() as f64 > threshold * window as f64,
        _ => false,
    }
}

async fn load_and_store<F, Fut>(
    handle: &StoreHandle,
    key: CacheKey,
    loader: F,
    ttl: Option<Duration>,
) -> Result<Option<Value>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<Option<Value>>>,
{
    let loaded = loader().await.map_err(CacheError::Loader)?;

    match loaded {
        Some(value) if !value.is_null() => {
            handle.set_key(key, value.clone(), ttl).await;
            Ok(Some(value))
        }
        other => Ok(other),
    }
}
