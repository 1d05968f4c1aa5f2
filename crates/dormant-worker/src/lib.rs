//! Background synchronization for the activity cache.
//!
//! This crate provides:
//! - A guarded sync task that isolates panics and never overlaps itself
//! - A start/stop lifecycle that runs the sync on a fixed period and
//!   flushes the cache once more on shutdown

pub mod lifecycle;
pub mod synchronizer;

pub use lifecycle::SyncLifecycle;
pub use synchronizer::GuardedSync;
