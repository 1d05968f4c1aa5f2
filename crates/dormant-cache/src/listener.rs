//! Turns host activity events into cache marks.

use std::sync::Arc;

use tracing::trace;

use dormant_core::events::ActivityEvent;

use crate::cache::ActivityCache;

/// Marks the acting account active for every relevant event.
#[derive(Debug, Clone)]
pub struct ActivityListener {
    cache: Arc<ActivityCache>,
}

impl ActivityListener {
    /// Create a listener feeding `cache`.
    pub fn new(cache: Arc<ActivityCache>) -> Self {
        Self { cache }
    }

    /// Handle one event. Anonymous events are ignored, as is an account
    /// rewriting its own record (the echo of a timestamp write).
    pub async fn on_event(&self, event: &ActivityEvent) {
        let Some(actor) = event.actor() else {
            trace!(event = event.event_type(), "Ignoring anonymous event");
            return;
        };
        if let ActivityEvent::RecordUpdated {
            record_owner: Some(owner),
            ..
        } = event
        {
            if *owner == actor {
                trace!(account_id = %actor, "Ignoring self record update");
                return;
            }
        }
        self.cache.mark_active(actor).await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration};
    use dormant_core::config::DormantSettings;
    use dormant_core::events::ChangeKind;
    use dormant_core::traits::ManualClock;
    use dormant_core::types::AccountId;
    use dormant_storage::{DurableRecordStore, MemoryAccountDirectory, MemoryTimestampStore};

    use super::*;

    fn listener() -> (ActivityListener, Arc<ActivityCache>) {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let store = DurableRecordStore::new(
            Arc::new(MemoryTimestampStore::new()),
            Arc::new(MemoryAccountDirectory::new()),
        );
        let cache = Arc::new(ActivityCache::new(
            store,
            DormantSettings::with_defaults(start - Duration::days(365)),
            Arc::new(ManualClock::new(start)),
        ));
        (ActivityListener::new(cache.clone()), cache)
    }

    #[tokio::test]
    async fn test_identified_events_mark_actor() {
        let (listener, cache) = listener();
        let ada = AccountId::new();
        let bob = AccountId::new();
        let cy = AccountId::new();

        listener.on_event(&ActivityEvent::Login { account_id: ada }).await;
        listener
            .on_event(&ActivityEvent::Change {
                account_id: bob,
                kind: ChangeKind::Submit,
            })
            .await;
        listener
            .on_event(&ActivityEvent::HttpRequest {
                account_id: Some(cy),
                path: "/changes/".to_string(),
            })
            .await;

        assert!(cache.last_active(ada).is_some());
        assert!(cache.last_active(bob).is_some());
        assert!(cache.last_active(cy).is_some());
    }

    #[tokio::test]
    async fn test_anonymous_events_are_ignored() {
        let (listener, cache) = listener();
        listener
            .on_event(&ActivityEvent::Audit {
                account_id: None,
                action: "GET /config/server/version".to_string(),
            })
            .await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_self_record_update_is_ignored() {
        let (listener, cache) = listener();
        let ada = AccountId::new();
        let admin = AccountId::new();

        listener
            .on_event(&ActivityEvent::RecordUpdated {
                account_id: ada,
                record_owner: Some(ada),
            })
            .await;
        assert!(cache.is_empty());

        listener
            .on_event(&ActivityEvent::RecordUpdated {
                account_id: admin,
                record_owner: Some(ada),
            })
            .await;
        assert!(cache.last_active(admin).is_some());
        assert!(cache.last_active(ada).is_none());
    }
}
