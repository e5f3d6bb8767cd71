//! Write-Behind Queue Module
//!
//! FIFO of pending persistence operations drained in bounded batches with
//! per-item retry.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::config::WriteBehindConfig;
use crate::write_behind::WriteBehindItem;

const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(5);

// == Drain Report ==
/// Outcome of one drain cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub persisted: usize,
    pub requeued: usize,
    pub abandoned: usize,
    /// True if another drain was already running and this one did nothing
    pub skipped: bool,
}

impl DrainReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn processed(&self) -> usize {
        self.persisted + self.requeued + self.abandoned
    }
}

/// Clears the draining flag when a drain finishes or is cancelled.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// == Write-Behind Queue ==
/// Best-effort persistence queue.
///
/// Items still queued when the process exits are lost.
#[derive(Debug)]
pub struct WriteBehindQueue {
    items: Mutex<VecDeque<WriteBehindItem>>,
    draining: AtomicBool,
    batch_size: usize,
    max_retries: u32,
}

impl WriteBehindQueue {
    pub fn new(batch_size: usize, max_retries: u32) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            draining: AtomicBool::new(false),
            batch_size: batch_size.max(1),
            max_retries,
        }
    }

    pub fn from_config(config: &WriteBehindConfig) -> Self {
        Self::new(config.batch_size, config.max_retries)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<WriteBehindItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an item and returns the new queue length.
    pub fn push(&self, item: WriteBehindItem) -> usize {
        let mut items = self.lock();
        items.push_back(item);
        items.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    // == Drain ==
    /// Persists up to one batch of items concurrently.
    ///
    /// Only one drain runs at a time; a call that finds another in progress
    /// returns a skipped report immediately. A failed item is requeued at the
    /// tail until it has been retried `max_retries` times, then dropped.
    pub async fn drain(&self) -> DrainReport {
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("write-behind drain already in progress");
            return DrainReport::skipped();
        }
        let _guard = DrainGuard(&self.draining);

        let batch: Vec<WriteBehindItem> = {
            let mut items = self.lock();
            let take = self.batch_size.min(items.len());
            items.drain(..take).collect()
        };

        let mut report = DrainReport::default();
        if batch.is_empty() {
            return report;
        }

        let results = join_all(batch.iter().map(WriteBehindItem::attempt)).await;

        let mut retry = Vec::new();
        for (mut item, result) in batch.into_iter().zip(results) {
            match result {
                Ok(()) => report.persisted += 1,
                Err(err) if item.retry_count < self.max_retries => {
                    item.retry_count += 1;
                    warn!(
                        key = %item.key,
                        retry = item.retry_count,
                        error = %err,
                        "write-behind persist failed, requeueing"
                    );
                    retry.push(item);
                }
                Err(err) => {
                    error!(
                        key = %item.key,
                        attempts = item.retry_count + 1,
                        enqueued_at = item.enqueued_at,
                        error = %err,
                        "write-behind persist abandoned, update lost"
                    );
                    report.abandoned += 1;
                }
            }
        }

        report.requeued = retry.len();
        if !retry.is_empty() {
            self.lock().extend(retry);
        }

        debug!(
            persisted = report.persisted,
            requeued = report.requeued,
            abandoned = report.abandoned,
            "write-behind drain complete"
        );
        report
    }

    // == Flush ==
    /// Drains repeatedly until the queue is empty and no drain is running.
    ///
    /// A drain already in progress elsewhere is waited out, and whatever it
    /// requeues is drained here. Each item is attempted at most
    /// `max_retries + 1` times, so this ends unless writers keep enqueueing.
    /// The report covers only the drains this call ran.
    pub async fn flush(&self) -> DrainReport {
        let mut total = DrainReport::default();

        // draining is read first: a drain requeues before releasing the flag
        while self.is_draining() || !self.is_empty() {
            let report = self.drain().await;
            if report.skipped {
                tokio::time::sleep(FLUSH_POLL_INTERVAL).await;
                continue;
            }
            total.persisted += report.persisted;
            total.requeued += report.requeued;
            total.abandoned += report.abandoned;
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;
    use crate::write_behind::persist_fn;
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn item(key: &str, persist: crate::write_behind::PersistFn) -> WriteBehindItem {
        WriteBehindItem::new(CacheKey::from(key), json!(key), persist)
    }

    fn counting_ok(count: Arc<AtomicUsize>) -> crate::write_behind::PersistFn {
        persist_fn(move |_| {
            let count = count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    fn always_fail(count: Arc<AtomicUsize>) -> crate::write_behind::PersistFn {
        persist_fn(move |_| {
            let count = count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err(anyhow::anyhow!("backend unavailable"))
            }
        })
    }

    #[tokio::test]
    async fn test_drain_respects_batch_size_and_fifo() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let queue = WriteBehindQueue::new(2, 3);

        for key in ["a", "b", "c"] {
            let order = order.clone();
            queue.push(item(
                key,
                persist_fn(move |value: Value| {
                    let order = order.clone();
                    async move {
                        order.lock().unwrap().push(value);
                        Ok(())
                    }
                }),
            ));
        }

        let report = queue.drain().await;
        assert_eq!(report.persisted, 2);
        assert_eq!(queue.len(), 1);

        let report = queue.drain().await;
        assert_eq!(report.persisted, 1);
        assert!(queue.is_empty());

        let persisted = order.lock().unwrap().clone();
        assert_eq!(persisted.last(), Some(&json!("c")));
        assert_eq!(persisted.len(), 3);
    }

    #[tokio::test]
    async fn test_failure_does_not_block_siblings() {
        let ok = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));
        let queue = WriteBehindQueue::new(10, 3);

        queue.push(item("good1", counting_ok(ok.clone())));
        queue.push(item("bad", always_fail(failed.clone())));
        queue.push(item("good2", counting_ok(ok.clone())));

        let report = queue.drain().await;
        assert_eq!(report.persisted, 2);
        assert_eq!(report.requeued, 1);
        assert_eq!(ok.load(Ordering::SeqCst), 2);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_item_abandoned_after_max_retries() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let queue = WriteBehindQueue::new(10, 3);
        queue.push(item("doomed", always_fail(attempts.clone())));

        for _ in 0..3 {
            let report = queue.drain().await;
            assert_eq!(report.requeued, 1);
        }
        let report = queue.drain().await;
        assert_eq!(report.abandoned, 1);
        assert!(queue.is_empty());
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_transient_failure_eventually_persists() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let queue = WriteBehindQueue::new(10, 3);
        queue.push(item(
            "flaky",
            persist_fn(move |_| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(anyhow::anyhow!("transient"))
                    } else {
                        Ok(())
                    }
                }
            }),
        ));

        let report = queue.flush().await;
        assert_eq!(report.persisted, 1);
        assert_eq!(report.abandoned, 0);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concurrent_drain_is_skipped() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let started = Arc::new(tokio::sync::Notify::new());
        let attempts = Arc::new(AtomicUsize::new(0));
        let queue = Arc::new(WriteBehindQueue::new(10, 3));

        let (g, s, a) = (gate.clone(), started.clone(), attempts.clone());
        queue.push(item(
            "slow",
            persist_fn(move |_| {
                let (g, s, a) = (g.clone(), s.clone(), a.clone());
                async move {
                    a.fetch_add(1, Ordering::SeqCst);
                    s.notify_one();
                    g.notified().await;
                    Ok(())
                }
            }),
        ));

        let first = tokio::spawn({
            let queue = queue.clone();
            async move { queue.drain().await }
        });
        started.notified().await;

        assert!(queue.is_draining());
        let second = queue.drain().await;
        assert!(second.skipped);

        gate.notify_one();
        let first = first.await.unwrap();
        assert_eq!(first.persisted, 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(!queue.is_draining());
    }

    #[tokio::test]
    async fn test_flush_waits_for_in_flight_drain() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let started = Arc::new(tokio::sync::Notify::new());
        let attempts = Arc::new(AtomicUsize::new(0));
        let persisted = Arc::new(AtomicUsize::new(0));
        let queue = Arc::new(WriteBehindQueue::new(10, 3));

        // first attempt blocks and then fails, so the in-flight drain requeues it
        let (g, s, a, p) = (gate.clone(), started.clone(), attempts.clone(), persisted.clone());
        queue.push(item(
            "slow",
            persist_fn(move |_| {
                let (g, s, a, p) = (g.clone(), s.clone(), a.clone(), p.clone());
                async move {
                    if a.fetch_add(1, Ordering::SeqCst) == 0 {
                        s.notify_one();
                        g.notified().await;
                        return Err(anyhow::anyhow!("connection reset"));
                    }
                    p.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        ));

        let background = tokio::spawn({
            let queue = queue.clone();
            async move { queue.drain().await }
        });
        started.notified().await;
        assert!(queue.is_empty());
        assert!(queue.is_draining());

        let flush = tokio::spawn({
            let queue = queue.clone();
            async move { queue.flush().await }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!flush.is_finished());

        gate.notify_one();
        assert_eq!(background.await.unwrap().requeued, 1);
        let report = flush.await.unwrap();

        assert_eq!(report.persisted, 1);
        assert_eq!(persisted.load(Ordering::SeqCst), 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(queue.is_empty());
        assert!(!queue.is_draining());
    }

    #[tokio::test]
    async fn test_flush_counts_requeues() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let queue = WriteBehindQueue::new(10, 1);
        queue.push(item("doomed", always_fail(attempts.clone())));

        let report = queue.flush().await;

        assert_eq!(report.requeued, 1);
        assert_eq!(report.abandoned, 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_drain_empty_queue() {
        let queue = WriteBehindQueue::new(10, 3);
        let report = queue.drain().await;
        assert_eq!(report.processed(), 0);
        assert!(!report.skipped);
    }
}
