//! Guarded execution of one cache synchronization pass.

use std::sync::Arc;

use tokio::sync::Mutex;

use dormant_cache::{ActivityCache, SyncReport};

/// Runs [`ActivityCache::sync`] on its own task so a panic inside a pass is
/// contained and logged. Passes never overlap.
#[derive(Debug)]
pub struct GuardedSync {
    cache: Arc<ActivityCache>,
    running: Mutex<()>,
}

impl GuardedSync {
    /// Create a guarded sync over `cache`.
    pub fn new(cache: Arc<ActivityCache>) -> Self {
        Self {
            cache,
            running: Mutex::new(()),
        }
    }

    /// Run one pass. `trigger` names the caller in logs. Returns `None` if
    /// the pass panicked or was aborted.
    pub async fn run(&self, trigger: &str) -> Option<SyncReport> {
        let _running = self.running.lock().await;
        tracing::debug!(trigger, "Starting activity sync");

        let cache = Arc::clone(&self.cache);
        match tokio::spawn(async move { cache.sync().await }).await {
            Ok(report) => {
                if report.failures > 0 {
                    tracing::warn!(trigger, %report, "Activity sync finished with failures");
                }
                Some(report)
            }
            Err(e) if e.is_panic() => {
                tracing::error!(trigger, error = %e, "Activity sync panicked");
                None
            }
            Err(e) => {
                tracing::error!(trigger, error = %e, "Activity sync was aborted");
                None
            }
        }
    }
}
