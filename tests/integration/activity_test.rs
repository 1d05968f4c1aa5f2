//! Integration tests for activity tracking over file-backed stores.

mod helpers;

use chrono::Duration;

use dormant_cache::ActivityListener;
use dormant_core::config::DormantSettings;
use dormant_core::events::{ActivityEvent, ChangeKind};
use dormant_storage::EpochStore;

use helpers::{TestDeployment, short_period_settings, start};

#[tokio::test]
async fn test_activity_survives_restart() {
    let d = TestDeployment::new(&["ada", "bob"]);
    let settings = short_period_settings();

    let cache = d.load_cache(settings.clone()).await;
    cache.mark_active(d.id("ada")).await;
    cache.sync().await;
    drop(cache);

    d.clock.advance(Duration::seconds(30));
    let cache = d.load_cache(settings.clone()).await;
    assert_eq!(cache.last_active(d.id("ada")), Some(start()));
    assert!(cache.is_active(d.id("ada")));
    assert_eq!(cache.last_active(d.id("bob")), None);
    assert!(!cache.is_active(d.id("bob")));
    assert_eq!(d.timestamp("bob").await, None);
}

#[tokio::test]
async fn test_account_goes_dormant_and_returns() {
    let d = TestDeployment::new(&["ada", "bob"]);
    let cache = d.load_cache(short_period_settings()).await;

    cache.mark_active(d.id("ada")).await;
    let report = cache.sync().await;
    assert_eq!(report.deactivated, 1);
    assert_eq!(d.status("bob").await.as_deref(), Some("dormant"));
    assert_eq!(d.status("ada").await, None);

    d.clock.advance(Duration::minutes(2));
    cache.sync().await;
    assert_eq!(d.status("ada").await.as_deref(), Some("dormant"));
    assert!(!cache.in_active_set(d.id("ada")));

    d.clock.advance(Duration::minutes(1));
    cache.mark_active(d.id("ada")).await;
    assert_eq!(d.status("ada").await.as_deref(), Some(""));
    assert!(cache.in_active_set(d.id("ada")));

    cache.sync().await;
    assert_eq!(
        d.timestamp("ada").await,
        Some(start() + Duration::minutes(3))
    );
}

#[tokio::test]
async fn test_events_reach_disk() {
    let d = TestDeployment::new(&["ada", "bob"]);
    let cache = d.load_cache(short_period_settings()).await;
    let listener = ActivityListener::new(cache.clone());

    d.clock.advance(Duration::seconds(5));
    listener
        .on_event(&ActivityEvent::Change {
            account_id: d.id("ada"),
            kind: ChangeKind::Upload,
        })
        .await;
    listener
        .on_event(&ActivityEvent::HttpRequest {
            account_id: None,
            path: "/".to_string(),
        })
        .await;
    cache.sync().await;

    assert_eq!(
        d.timestamp("ada").await,
        Some(start() + Duration::seconds(5))
    );
    assert_eq!(d.status("ada").await, None);
    assert_eq!(d.status("bob").await.as_deref(), Some("dormant"));
}

#[tokio::test]
async fn test_two_instances_converge_on_newest_timestamp() {
    let d = TestDeployment::new(&["ada"]);
    let ada = d.id("ada");
    let first = d.load_cache(short_period_settings()).await;
    let second = d.load_cache(short_period_settings()).await;

    d.clock.set(start() + Duration::seconds(20));
    second.mark_active(ada).await;
    d.clock.set(start() + Duration::seconds(10));
    first.mark_active(ada).await;

    second.sync().await;
    let report = first.sync().await;
    assert_eq!(report.timestamps_written, 0);
    assert_eq!(d.timestamp("ada").await, Some(start() + Duration::seconds(20)));
    assert_eq!(first.last_active(ada), Some(start() + Duration::seconds(20)));

    assert!(first.sync().await.is_quiet());
    assert!(second.sync().await.is_quiet());
}

#[tokio::test]
async fn test_fresh_install_grace_period() {
    let d = TestDeployment::new(&["ada", "bob"]);
    let mut settings = DormantSettings::with_defaults(start());
    settings.dormant_period = Duration::minutes(10);
    let cache = d.load_cache(settings).await;

    let report = cache.sync().await;
    assert_eq!(report.deactivated, 0);
    assert_eq!(d.status("ada").await, None);
    assert_eq!(d.status("bob").await, None);

    d.clock.advance(Duration::minutes(11));
    let report = cache.sync().await;
    assert_eq!(report.deactivated, 2);
    assert_eq!(d.status("ada").await.as_deref(), Some("dormant"));
    assert_eq!(d.status("bob").await.as_deref(), Some("dormant"));
}

#[tokio::test]
async fn test_epoch_is_stable_across_restarts() {
    let d = TestDeployment::new(&[]);
    let epochs = EpochStore::new(d.config.storage.state_path());

    let first = epochs.resolve(None, start()).await;
    let second = epochs
        .resolve(None, start() + Duration::days(10))
        .await;
    assert_eq!(first, start());
    assert_eq!(second, start());
}
