//! Start/stop lifecycle of the periodic activity sync.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use dormant_cache::{ActivityCache, SyncReport};
use dormant_core::config::DormantSettings;
use dormant_core::config::scheduler::SchedulerConfig;

use crate::synchronizer::GuardedSync;

#[derive(Debug)]
struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runs the cache sync every polling period while started, and flushes the
/// cache one final time when stopped.
#[derive(Debug)]
pub struct SyncLifecycle {
    sync: Arc<GuardedSync>,
    polling_period: Duration,
    shutdown_timeout: Duration,
    running: Mutex<Option<Running>>,
}

impl SyncLifecycle {
    /// Create a stopped lifecycle.
    pub fn new(cache: Arc<ActivityCache>, polling_period: Duration, shutdown_timeout: Duration) -> Self {
        Self {
            sync: Arc::new(GuardedSync::new(cache)),
            polling_period,
            shutdown_timeout,
            running: Mutex::new(None),
        }
    }

    /// Create a stopped lifecycle from resolved settings.
    pub fn from_config(
        cache: Arc<ActivityCache>,
        settings: &DormantSettings,
        scheduler: &SchedulerConfig,
    ) -> Self {
        Self::new(cache, settings.polling_period, scheduler.shutdown_timeout())
    }

    /// Whether the periodic sync is scheduled.
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Schedule the sync every polling period, first run one full period
    /// from now. Returns `false` if already running.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if running.is_some() {
            tracing::info!("Activity sync already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_periodic(
            Arc::clone(&self.sync),
            self.polling_period,
            cancel.clone(),
        ));
        *running = Some(Running { cancel, handle });

        tracing::info!(
            polling_period_secs = self.polling_period.as_secs(),
            "Activity sync scheduled"
        );
        true
    }

    /// Cancel the periodic sync, wait for an in-flight pass, then run one
    /// final pass. Both waits are bounded by the shutdown timeout. The final
    /// pass runs even if the lifecycle was never started.
    pub async fn stop(&self) -> Option<SyncReport> {
        let running = self
            .running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        if let Some(Running { cancel, handle }) = running {
            cancel.cancel();
            match time::timeout(self.shutdown_timeout, handle).await {
                Ok(Ok(())) => tracing::debug!("Periodic activity sync stopped"),
                Ok(Err(e)) => tracing::error!(error = %e, "Periodic activity sync task failed"),
                Err(_) => tracing::warn!(
                    timeout_secs = self.shutdown_timeout.as_secs(),
                    "Timed out waiting for in-flight activity sync"
                ),
            }
        }

        tracing::info!("Running final activity sync");
        match time::timeout(self.shutdown_timeout, self.sync.run("shutdown")).await {
            Ok(report) => report,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.shutdown_timeout.as_secs(),
                    "Final activity sync timed out"
                );
                None
            }
        }
    }
}

async fn run_periodic(sync: Arc<GuardedSync>, period: Duration, cancel: CancellationToken) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        sync.run("scheduled").await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use dormant_core::result::AppResult;
    use dormant_core::traits::{ManualClock, TimestampStore};
    use dormant_core::types::AccountId;
    use dormant_storage::{DurableRecordStore, MemoryAccountDirectory, MemoryTimestampStore};

    use super::*;

    const PERIOD: Duration = Duration::from_secs(10);
    const TIMEOUT: Duration = Duration::from_secs(5);

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn cache_over(timestamps: Arc<dyn TimestampStore>) -> Arc<ActivityCache> {
        let store = DurableRecordStore::new(timestamps, Arc::new(MemoryAccountDirectory::new()));
        Arc::new(ActivityCache::new(
            store,
            DormantSettings::with_defaults(start()),
            Arc::new(ManualClock::new(start())),
        ))
    }

    /// Panics on the first read, then delegates.
    #[derive(Debug, Default)]
    struct PanicOnceStore {
        inner: MemoryTimestampStore,
        panicked: AtomicBool,
    }

    #[async_trait]
    impl TimestampStore for PanicOnceStore {
        async fn read_timestamp(&self, id: AccountId) -> AppResult<Option<DateTime<Utc>>> {
            if !self.panicked.swap(true, Ordering::SeqCst) {
                panic!("simulated store panic");
            }
            self.inner.read_timestamp(id).await
        }

        async fn write_timestamp(&self, id: AccountId, timestamp: DateTime<Utc>) -> AppResult<()> {
            self.inner.write_timestamp(id, timestamp).await
        }

        fn backend(&self) -> &str {
            "panic-once"
        }
    }

    /// Never answers a read.
    #[derive(Debug, Default)]
    struct HangingStore;

    #[async_trait]
    impl TimestampStore for HangingStore {
        async fn read_timestamp(&self, _id: AccountId) -> AppResult<Option<DateTime<Utc>>> {
            std::future::pending().await
        }

        async fn write_timestamp(&self, _id: AccountId, _timestamp: DateTime<Utc>) -> AppResult<()> {
            Ok(())
        }

        fn backend(&self) -> &str {
            "hanging"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_run_after_one_period() {
        let timestamps = Arc::new(MemoryTimestampStore::new());
        let cache = cache_over(timestamps.clone());
        let lifecycle = SyncLifecycle::new(cache.clone(), PERIOD, TIMEOUT);
        let id = AccountId::new();
        cache.mark_active(id).await;

        assert!(lifecycle.start());
        time::sleep(PERIOD - Duration::from_secs(1)).await;
        assert_eq!(timestamps.write_count(), 0);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(timestamps.peek(id), Some(start()));
        lifecycle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_flushes_marks_since_last_run() {
        let timestamps = Arc::new(MemoryTimestampStore::new());
        let cache = cache_over(timestamps.clone());
        let lifecycle = SyncLifecycle::new(cache.clone(), PERIOD, TIMEOUT);
        lifecycle.start();

        let id = AccountId::new();
        cache.mark_active(id).await;
        let report = lifecycle.stop().await.unwrap();

        assert_eq!(report.timestamps_written, 1);
        assert_eq!(timestamps.peek(id), Some(start()));
        assert!(!lifecycle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_without_start_still_flushes() {
        let timestamps = Arc::new(MemoryTimestampStore::new());
        let cache = cache_over(timestamps.clone());
        let lifecycle = SyncLifecycle::new(cache.clone(), PERIOD, TIMEOUT);

        let id = AccountId::new();
        cache.mark_active(id).await;
        lifecycle.stop().await;
        assert_eq!(timestamps.peek(id), Some(start()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_reentrant() {
        let cache = cache_over(Arc::new(MemoryTimestampStore::new()));
        let lifecycle = SyncLifecycle::new(cache, PERIOD, TIMEOUT);

        assert!(lifecycle.start());
        assert!(!lifecycle.start());
        assert!(lifecycle.is_running());

        lifecycle.stop().await;
        assert!(!lifecycle.is_running());
        assert!(lifecycle.start());
        lifecycle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_bounded_when_store_hangs() {
        let cache = cache_over(Arc::new(HangingStore));
        let lifecycle = SyncLifecycle::new(cache.clone(), PERIOD, TIMEOUT);
        cache.mark_active(AccountId::new()).await;

        lifecycle.start();
        time::sleep(PERIOD + Duration::from_secs(1)).await;

        let began = Instant::now();
        assert!(lifecycle.stop().await.is_none());
        assert!(began.elapsed() <= TIMEOUT * 2);
        assert!(!lifecycle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_run_does_not_stop_schedule() {
        let timestamps = Arc::new(PanicOnceStore::default());
        let cache = cache_over(timestamps.clone());
        let lifecycle = SyncLifecycle::new(cache.clone(), PERIOD, TIMEOUT);
        let id = AccountId::new();
        cache.mark_active(id).await;

        lifecycle.start();
        time::sleep(PERIOD + Duration::from_secs(1)).await;
        assert!(timestamps.panicked.load(Ordering::SeqCst));
        assert_eq!(timestamps.inner.peek(id), None);

        time::sleep(PERIOD).await;
        assert!(lifecycle.is_running());
        assert_eq!(timestamps.inner.peek(id), Some(start()));
        lifecycle.stop().await;
    }
}
