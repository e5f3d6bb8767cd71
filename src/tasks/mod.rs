//! Background Tasks Module
//!
//! Scheduled work that runs during the manager's lifetime.
//!
//! # Tasks
//! - TTL Sweep: removes expired entries from a store at its cleanup interval
//! - Write-Behind Drain: persists queued writes at a fixed interval

mod cleanup;
mod drain;
mod periodic;

pub use cleanup::spawn_sweep_task;
pub use drain::spawn_drain_task;
pub use periodic::PeriodicTask;
