//! TTL Sweep Task
//!
//! Background task that periodically removes expired entries from a store.

use std::time::Duration;

use tracing::{debug, info};

use crate::cache::StoreHandle;
use crate::tasks::PeriodicTask;

/// Starts the expiry sweep for `store`.
///
/// Each tick removes every expired entry and logs how many went. Stop the
/// returned task (or drop it) to end the sweep.
///
/// # Example
/// ```ignore
/// let handle = StoreHandle::new("sessions", CacheStore::new(1000, None));
/// let mut sweeper = spawn_sweep_task(handle.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweeper.stop();
/// ```
pub fn spawn_sweep_task(store: StoreHandle, interval: Duration) -> PeriodicTask {
    let name = format!("sweep:{}", store.name());

    PeriodicTask::start(name, interval, move || {
        let store = store.clone();
        async move {
            let removed = store.sweep_expired().await;
            if removed > 0 {
                info!(store = store.name(), removed, "TTL sweep removed expired entries");
            } else {
                debug!(store = store.name(), "TTL sweep found no expired entries");
            }
        }
    })
}
