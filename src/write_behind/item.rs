//! Write-Behind Item Module
//!
//! A pending persistence operation and the boxed persist callback it carries.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;

use crate::cache::{current_timestamp_ms, CacheKey};

/// A retryable persist callback.
///
/// It may be invoked several times for the same value when earlier attempts
/// fail.
pub type PersistFn = Arc<dyn Fn(Value) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Boxes an async closure into a [`PersistFn`].
///
/// ```ignore
/// let persist = persist_fn(move |value| {
///     let db = db.clone();
///     async move { db.save(value).await }
/// });
/// ```
pub fn persist_fn<F, Fut>(f: F) -> PersistFn
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |value| f(value).boxed())
}

// == Write-Behind Item ==
/// One queued write awaiting persistence.
#[derive(Clone)]
pub struct WriteBehindItem {
    pub key: CacheKey,
    pub value: Value,
    pub persist: PersistFn,
    /// Unix milliseconds of the first enqueue
    pub enqueued_at: u64,
    /// Failed attempts so far
    pub retry_count: u32,
}

impl WriteBehindItem {
    pub fn new(key: CacheKey, value: Value, persist: PersistFn) -> Self {
        Self {
            key,
            value,
            persist,
            enqueued_at: current_timestamp_ms(),
            retry_count: 0,
        }
    }

    /// Runs the persist callback once against a copy of the value.
    pub fn attempt(&self) -> BoxFuture<'static, anyhow::Result<()>> {
        (self.persist)(self.value.clone())
    }
}

impl fmt::Debug for WriteBehindItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteBehindItem")
            .field("key", &self.key)
            .field("enqueued_at", &self.enqueued_at)
            .field("retry_count", &self.retry_count)
            .finish_non_exhaustive()
    }
}
