//! Write-Behind Drain Task
//!
//! Fixed-interval drain that guarantees queued writes are eventually
//! persisted under low traffic.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::tasks::PeriodicTask;
use crate::write_behind::WriteBehindQueue;

/// Starts the background drain for `queue`.
pub fn spawn_drain_task(queue: Arc<WriteBehindQueue>, interval: Duration) -> PeriodicTask {
    PeriodicTask::start("write-behind-drain", interval, move || {
        let queue = queue.clone();
        async move {
            if queue.is_empty() {
                return;
            }
            let report = queue.drain().await;
            debug!(
                persisted = report.persisted,
                requeued = report.requeued,
                abandoned = report.abandoned,
                skipped = report.skipped,
                "timed write-behind drain"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;
    use crate::write_behind::{persist_fn, WriteBehindItem};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_drain_task_persists_below_batch_size() {
        let persisted = Arc::new(AtomicUsize::new(0));
        let counter = persisted.clone();
        let queue = Arc::new(WriteBehindQueue::new(10, 3));

        queue.push(WriteBehindItem::new(
            CacheKey::from("k"),
            json!(1),
            persist_fn(move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        ));

        let _task = spawn_drain_task(queue.clone(), Duration::from_millis(20));

        for _ in 0..50 {
            if persisted.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(persisted.load(Ordering::SeqCst), 1);
        assert!(queue.is_empty());
    }
}
