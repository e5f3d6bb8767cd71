//! Periodic Task
//!
//! A named background loop with an explicit start/stop lifecycle.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A background task that runs `tick` every `interval`.
///
/// The first tick fires one full interval after start. Dropping the task
/// aborts it; [`shutdown`](Self::shutdown) lets a running tick finish first.
#[derive(Debug)]
pub struct PeriodicTask {
    name: String,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
    stop_tx: watch::Sender<bool>,
}

impl PeriodicTask {
    /// Spawns the loop on the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn start<F, Fut>(name: impl Into<String>, interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let task_name = name.clone();
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            info!(task = %task_name, interval_ms = interval.as_millis() as u64, "periodic task started");
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                // a tick in progress is never interrupted by shutdown
                tick().await;
            }
            debug!(task = %task_name, "periodic task exited");
        });

        Self {
            name,
            interval,
            handle: Some(handle),
            stop_tx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signals the loop to exit and waits for a tick in progress to finish.
    /// Idempotent.
    pub async fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let _ = self.stop_tx.send(true);
        if let Err(err) = handle.await {
            warn!(task = %self.name, error = %err, "periodic task ended abnormally");
        }
        debug!(task = %self.name, "periodic task shut down");
    }

    /// Aborts the loop, cancelling a tick in progress. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!(task = %self.name, "periodic task stopped");
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_task_ticks_repeatedly() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();

        let mut task = PeriodicTask::start("counter", Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(count.load(Ordering::SeqCst) >= 2);
        assert!(task.is_running());

        task.stop();
        task.stop();
        assert!(!task.is_running());
    }

    #[tokio::test]
    async fn test_stopped_task_no_longer_ticks() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();

        let task = PeriodicTask::start("counter", Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(task);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_stop = count.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_running_tick() {
        let started = Arc::new(tokio::sync::Notify::new());
        let gate = Arc::new(tokio::sync::Notify::new());
        let finished = Arc::new(AtomicUsize::new(0));
        let (s, g, f) = (started.clone(), gate.clone(), finished.clone());

        let mut task = PeriodicTask::start("gated", Duration::from_millis(10), move || {
            let (s, g, f) = (s.clone(), g.clone(), f.clone());
            async move {
                s.notify_one();
                g.notified().await;
                f.fetch_add(1, Ordering::SeqCst);
            }
        });
        started.notified().await;

        let release = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            gate.notify_one();
        });
        task.shutdown().await;

        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(!task.is_running());
        task.shutdown().await;
        release.await.unwrap();
    }

    #[tokio::test]
    async fn test_first_tick_waits_one_interval() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();

        let _task = PeriodicTask::start("slow", Duration::from_secs(60), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
