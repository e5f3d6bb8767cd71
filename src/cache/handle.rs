//! Store Handle Module
//!
//! A cloneable, thread-safe reference to a named [`CacheStore`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::cache::{CacheEntry, CacheKey, CacheStats, CacheStore, RawKey, SetOutcome};

/// Shared handle to a store.
///
/// Each method takes the lock once and releases it before returning, so no
/// lock is ever held across caller-supplied I/O.
#[derive(Clone)]
pub struct StoreHandle {
    name: Arc<str>,
    inner: Arc<RwLock<CacheStore>>,
}

impl StoreHandle {
    pub fn new(name: impl Into<Arc<str>>, store: CacheStore) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if both handles point at the same store.
    pub fn same_store(&self, other: &StoreHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // == Keyed Operations ==

    pub async fn get(&self, key: impl Into<RawKey>, namespace: Option<&str>) -> Option<Value> {
        self.get_key(&CacheKey::new(namespace, key)).await
    }

    pub async fn set(
        &self,
        key: impl Into<RawKey>,
        value: Value,
        ttl: Option<Duration>,
        namespace: Option<&str>,
    ) -> SetOutcome {
        self.set_key(CacheKey::new(namespace, key), value, ttl).await
    }

    pub async fn delete(&self, key: impl Into<RawKey>, namespace: Option<&str>) -> bool {
        self.delete_key(&CacheKey::new(namespace, key)).await
    }

    // == Derived-Key Operations ==

    pub async fn get_key(&self, key: &CacheKey) -> Option<Value> {
        self.inner.write().await.get(key)
    }

    pub async fn get_entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.inner.write().await.get_entry(key)
    }

    pub async fn peek_key(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.inner.read().await.peek(key).cloned()
    }

    pub async fn set_key(&self, key: CacheKey, value: Value, ttl: Option<Duration>) -> SetOutcome {
        self.inner.write().await.set(key, value, ttl)
    }

    pub async fn delete_key(&self, key: &CacheKey) -> bool {
        self.inner.write().await.delete(key)
    }

    // == Maintenance ==

    pub async fn sweep_expired(&self) -> usize {
        self.inner.write().await.sweep_expired()
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn default_ttl(&self) -> Option<Duration> {
        self.inner.read().await.default_ttl()
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
