//! Cache Manager Module
//!
//! Registry of named stores plus the consistency strategies built on top of
//! them. Construct one manager at startup and share it as `Arc<CacheManager>`.

mod options;
mod strategies;
mod tiers;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{info, warn};

use crate::cache::{CacheKey, CacheStats, CacheStore, RawKey, StoreHandle};
use crate::config::{Config, StoreConfig, WriteBehindConfig};
use crate::error::Result;
use crate::tasks::{spawn_drain_task, spawn_sweep_task, PeriodicTask};
use crate::write_behind::{DrainReport, WriteBehindQueue};

pub use options::{
    CacheOptions, RefreshAheadOptions, TierOptions, WarmItem, WriteBehindOptions,
    DEFAULT_BATCH_SIZE, DEFAULT_REFRESH_THRESHOLD,
};

/// Name of the store every unknown name resolves to.
pub const DEFAULT_STORE: &str = "default";

/// A store and the sweep task it owns.
struct Registered {
    handle: StoreHandle,
    sweeper: Option<PeriodicTask>,
}

impl Registered {
    fn build(name: &str, config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let handle = StoreHandle::new(name, CacheStore::from_config(config));
        let sweeper = config
            .cleanup_interval
            .map(|interval| spawn_sweep_task(handle.clone(), interval));
        Ok(Self { handle, sweeper })
    }
}

struct Registry {
    default: Registered,
    named: HashMap<String, Registered>,
}

impl Registry {
    fn resolve(&self, name: &str) -> &Registered {
        self.named.get(name).unwrap_or(&self.default)
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &Registered)> {
        std::iter::once((DEFAULT_STORE, &self.default))
            .chain(self.named.iter().map(|(name, reg)| (name.as_str(), reg)))
    }
}

// == Cache Manager ==
pub struct CacheManager {
    registry: RwLock<Registry>,
    write_behind: Arc<WriteBehindQueue>,
    drain_task: Mutex<Option<PeriodicTask>>,
    /// (store, key) pairs with a background refresh in flight
    refreshing: Arc<Mutex<HashSet<(String, CacheKey)>>>,
}

impl CacheManager {
    /// Creates a manager with a default store and a write-behind queue.
    ///
    /// Background sweeps and the timed drain start immediately when their
    /// intervals are configured, which requires a running tokio runtime.
    pub fn new(default_store: StoreConfig, write_behind: WriteBehindConfig) -> Result<Self> {
        write_behind.validate()?;
        let default = Registered::build(DEFAULT_STORE, &default_store)?;
        let queue = Arc::new(WriteBehindQueue::from_config(&write_behind));
        let drain_task = write_behind
            .drain_interval
            .map(|interval| spawn_drain_task(queue.clone(), interval));

        Ok(Self {
            registry: RwLock::new(Registry {
                default,
                named: HashMap::new(),
            }),
            write_behind: queue,
            drain_task: Mutex::new(drain_task),
            refreshing: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.default_store.clone(), config.write_behind.clone())
    }

    // == Registry ==

    /// Creates (or replaces) the store called `name`.
    ///
    /// Replacing a store stops its sweep task. Handles to the old store stay
    /// valid but are no longer swept or reachable by name.
    pub fn create_cache(&self, name: &str, config: StoreConfig) -> Result<StoreHandle> {
        let registered = Registered::build(name, &config)?;
        let handle = registered.handle.clone();

        let previous = {
            let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            if name == DEFAULT_STORE {
                Some(std::mem::replace(&mut registry.default, registered))
            } else {
                registry.named.insert(name.to_string(), registered)
            }
        };

        if let Some(mut old) = previous {
            if let Some(sweeper) = old.sweeper.as_mut() {
                sweeper.stop();
            }
            warn!(store = name, "replaced existing store; previous sweep task stopped");
        }

        info!(
            store = name,
            capacity = config.capacity,
            default_ttl_ms = config.default_ttl.map(|t| t.as_millis() as u64),
            "cache store created"
        );
        Ok(handle)
    }

    /// Returns the store called `name`, or the default store if unknown.
    pub fn get_cache(&self, name: &str) -> StoreHandle {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(name)
            .handle
            .clone()
    }

    pub fn has_cache(&self, name: &str) -> bool {
        name == DEFAULT_STORE
            || self
                .registry
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .named
                .contains_key(name)
    }

    pub fn store_names(&self) -> Vec<String> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = registry.iter().map(|(name, _)| name.to_string()).collect();
        names.sort();
        names
    }

    fn handles(&self) -> Vec<StoreHandle> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, reg)| reg.handle.clone())
            .collect()
    }

    // == Maintenance ==

    /// Snapshot of every store's counters, keyed by store name.
    pub async fn get_all_stats(&self) -> BTreeMap<String, CacheStats> {
        let mut all = BTreeMap::new();
        for handle in self.handles() {
            all.insert(handle.name().to_string(), handle.stats().await);
        }
        all
    }

    /// Bulk-loads items into a store and returns how many were written.
    pub async fn warm_cache(&self, store: &str, items: Vec<WarmItem>) -> usize {
        let handle = self.get_cache(store);
        let mut warmed = 0;
        for item in items {
            handle.set_key(CacheKey::new(None, item.key), item.value, item.ttl).await;
            warmed += 1;
        }
        info!(store = handle.name(), warmed, "cache warmed");
        warmed
    }

    /// Removes one key, returning true if it was present.
    pub async fn invalidate(
        &self,
        store: &str,
        key: impl Into<RawKey>,
        namespace: Option<&str>,
    ) -> bool {
        self.get_cache(store).delete(key, namespace).await
    }

    pub fn write_behind_queue(&self) -> &WriteBehindQueue {
        &self.write_behind
    }

    /// Drains the write-behind queue until it is empty.
    pub async fn flush_write_behind(&self) -> DrainReport {
        let pending = self.write_behind.len();
        let report = self.write_behind.flush().await;
        info!(
            pending,
            persisted = report.persisted,
            abandoned = report.abandoned,
            "write-behind queue flushed"
        );
        report
    }

    /// Graceful teardown: stops the timed drain, flushes the write-behind
    /// queue, then destroys.
    pub async fn shutdown(&self) -> DrainReport {
        self.stop_drain_task().await;
        let report = self.flush_write_behind().await;
        self.destroy().await;
        report
    }

    /// Stops every background task and empties every store.
    ///
    /// A timed drain already running is allowed to finish. Queued
    /// write-behind items are kept; use [`shutdown`](Self::shutdown) to
    /// persist them first.
    pub async fn destroy(&self) {
        self.stop_drain_task().await;

        let handles = {
            let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(sweeper) = registry.default.sweeper.as_mut() {
                sweeper.stop();
            }
            for reg in registry.named.values_mut() {
                if let Some(sweeper) = reg.sweeper.as_mut() {
                    sweeper.stop();
                }
            }
            registry
                .iter()
                .map(|(_, reg)| reg.handle.clone())
                .collect::<Vec<_>>()
        };

        for handle in &handles {
            handle.clear().await;
        }

        let pending = self.write_behind.len();
        if pending > 0 {
            warn!(pending, "cache manager destroyed with unpersisted write-behind items");
        }
        info!(stores = handles.len(), "cache manager destroyed");
    }

    async fn stop_drain_task(&self) {
        let task = self
            .drain_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut task) = task {
            task.shutdown().await;
        }
    }

    fn is_sweeping(&self, name: &str) -> bool {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(name)
            .sweeper
            .as_ref()
            .is_some_and(PeriodicTask::is_running)
    }
}
