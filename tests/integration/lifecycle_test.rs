//! Integration tests for the periodic sync lifecycle.

mod helpers;

use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::time;

use dormant_cache::ActivityListener;
use dormant_core::events::ActivityEvent;
use dormant_worker::SyncLifecycle;

use helpers::{MemoryDeployment, short_period_settings, start};

const PERIOD: StdDuration = StdDuration::from_secs(60);
const TIMEOUT: StdDuration = StdDuration::from_secs(5);

#[tokio::test(start_paused = true)]
async fn test_scheduled_runs_drive_transitions() {
    let d = MemoryDeployment::new();
    let ada = d.account("ada");
    let cache = d.load_cache(short_period_settings()).await;
    let lifecycle = SyncLifecycle::new(cache.clone(), PERIOD, TIMEOUT);

    cache.mark_active(ada).await;
    lifecycle.start();

    time::sleep(PERIOD + StdDuration::from_secs(1)).await;
    assert_eq!(d.timestamps.peek(ada), Some(start()));
    assert_eq!(d.directory.status(ada), None);

    d.clock.advance(Duration::minutes(2));
    time::sleep(PERIOD).await;
    assert_eq!(d.directory.status(ada).as_deref(), Some("dormant"));
    assert_eq!(d.directory.status_write_count(), 1);

    time::sleep(PERIOD).await;
    assert_eq!(d.directory.status_write_count(), 1);

    lifecycle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_flushes_events_since_last_run() {
    let d = MemoryDeployment::new();
    let ada = d.account("ada");
    let bob = d.account("bob");
    let cache = d.load_cache(short_period_settings()).await;
    let listener = ActivityListener::new(cache.clone());
    let lifecycle = SyncLifecycle::new(cache.clone(), PERIOD, TIMEOUT);
    lifecycle.start();

    time::sleep(PERIOD + StdDuration::from_secs(1)).await;
    let writes_after_first_run = d.timestamps.write_count();

    d.clock.advance(Duration::seconds(30));
    listener.on_event(&ActivityEvent::Login { account_id: ada }).await;
    listener.on_event(&ActivityEvent::Login { account_id: bob }).await;

    let report = lifecycle.stop().await.expect("final sync should complete");
    assert_eq!(report.timestamps_written, 2);
    assert_eq!(d.timestamps.write_count(), writes_after_first_run + 2);
    assert_eq!(d.timestamps.peek(ada), Some(start() + Duration::seconds(30)));
    assert_eq!(d.timestamps.peek(bob), Some(start() + Duration::seconds(30)));
}

#[tokio::test(start_paused = true)]
async fn test_failed_flush_is_retried_after_restart() {
    let d = MemoryDeployment::new();
    let ada = d.account("ada");
    let cache = d.load_cache(short_period_settings()).await;
    let lifecycle = SyncLifecycle::new(cache.clone(), PERIOD, TIMEOUT);

    cache.mark_active(ada).await;
    d.timestamps.set_fail_writes(true);
    let report = lifecycle.stop().await.expect("final sync should complete");
    assert_eq!(report.failures, 1);
    assert_eq!(d.timestamps.peek(ada), None);

    d.timestamps.set_fail_writes(false);
    lifecycle.start();
    time::sleep(PERIOD + StdDuration::from_secs(1)).await;
    assert_eq!(d.timestamps.peek(ada), Some(start()));
    lifecycle.stop().await;
}
