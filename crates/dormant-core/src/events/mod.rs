//! Domain events consumed by the activity cache.
//!
//! The host application decides which of its operations count as activity
//! and reports them as [`ActivityEvent`]s.

pub mod activity;

pub use activity::{ActivityEvent, ChangeKind};
