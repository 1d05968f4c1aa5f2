//! Periodic synchronization scheduler configuration.

use serde::{Deserialize, Serialize};

/// Scheduler settings. The polling period itself lives in
/// [`ActivityConfig`](super::activity::ActivityConfig).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the periodic sync loop is started at all. When disabled the
    /// cache is still flushed once on shutdown.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Seconds to wait for an in-flight sync and for the final flush during
    /// shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

impl SchedulerConfig {
    /// Shutdown timeout as a [`std::time::Duration`]. Zero falls back to the
    /// default.
    pub fn shutdown_timeout(&self) -> std::time::Duration {
        let seconds = match self.shutdown_timeout_seconds {
            0 => {
                tracing::error!(
                    default = default_shutdown_timeout(),
                    "scheduler.shutdown_timeout_seconds must be positive, using default"
                );
                default_shutdown_timeout()
            }
            seconds => seconds,
        };
        std::time::Duration::from_secs(seconds)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_shutdown_timeout() -> u64 {
    5
}
