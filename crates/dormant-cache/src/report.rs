//! Summary of one synchronization pass.

use std::fmt;

use serde::Serialize;

/// Counters collected while synchronizing the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Accounts visited.
    pub accounts: usize,
    /// Durable timestamp writes performed.
    pub timestamps_written: usize,
    /// Accounts that entered the active set.
    pub activated: usize,
    /// Accounts that left the active set.
    pub deactivated: usize,
    /// Merge or transition steps that failed and were logged.
    pub failures: usize,
}

impl SyncReport {
    /// Whether the pass changed nothing durable or in the active set.
    pub fn is_quiet(&self) -> bool {
        self.timestamps_written == 0 && self.activated == 0 && self.deactivated == 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accounts={} written={} activated={} deactivated={} failures={}",
            self.accounts, self.timestamps_written, self.activated, self.deactivated, self.failures
        )
    }
}
