//! # dormant-cache
//!
//! The activity cache and reconciliation engine: per-account last-activity
//! timestamps held in memory, merged monotonically into the durable store,
//! and reflected into the account status field.

pub mod cache;
pub mod listener;
pub mod merger;
pub mod report;
pub mod state;

pub use cache::ActivityCache;
pub use listener::ActivityListener;
pub use merger::{MergeOutcome, TimestampMerger};
pub use report::SyncReport;
pub use state::{StatusStateMachine, Transition};
