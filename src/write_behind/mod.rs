//! Write-Behind Module
//!
//! Deferred, best-effort persistence of cached writes.

mod item;
mod queue;

pub use item::{persist_fn, PersistFn, WriteBehindItem};
pub use queue::{DrainReport, WriteBehindQueue};
