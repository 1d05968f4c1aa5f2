//! The activity cache.
//!
//! Holds one [`ActivitySlot`] per known account. A slot's timestamp is an
//! atomic that only moves forward, so marking activity never waits on a
//! lock. Merges and status transitions for one account are serialized by
//! that account's async guard; different accounts never contend.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use dormant_core::config::DormantSettings;
use dormant_core::result::AppResult;
use dormant_core::traits::Clock;
use dormant_core::types::AccountId;
use dormant_storage::DurableRecordStore;

use crate::merger::TimestampMerger;
use crate::report::SyncReport;
use crate::state::{StatusStateMachine, Transition};

const UNSET: i64 = i64::MIN;

/// Per-account cache cell.
#[derive(Debug)]
struct ActivitySlot {
    /// Last activity in microseconds since the Unix epoch, or [`UNSET`].
    last_active: AtomicI64,
    /// Held for every merge and status transition of this account.
    guard: Mutex<()>,
}

impl ActivitySlot {
    fn new() -> Self {
        Self {
            last_active: AtomicI64::new(UNSET),
            guard: Mutex::new(()),
        }
    }

    fn get(&self) -> Option<DateTime<Utc>> {
        match self.last_active.load(Ordering::SeqCst) {
            UNSET => None,
            micros => DateTime::from_timestamp_micros(micros),
        }
    }

    /// Move the timestamp forward to `at`; older values are ignored.
    fn advance(&self, at: DateTime<Utc>) {
        self.last_active
            .fetch_max(at.timestamp_micros(), Ordering::SeqCst);
    }
}

/// In-memory last-activity cache with durable reconciliation.
#[derive(Debug)]
pub struct ActivityCache {
    store: DurableRecordStore,
    merger: TimestampMerger,
    machine: StatusStateMachine,
    settings: DormantSettings,
    clock: Arc<dyn Clock>,
    slots: DashMap<AccountId, Arc<ActivitySlot>>,
    /// Accounts believed to carry a non-dormant status.
    active: DashSet<AccountId>,
}

impl ActivityCache {
    /// Create an empty cache.
    pub fn new(store: DurableRecordStore, settings: DormantSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            merger: TimestampMerger::new(store.clone()),
            machine: StatusStateMachine::new(&settings),
            store,
            settings,
            clock,
            slots: DashMap::new(),
            active: DashSet::new(),
        }
    }

    /// Create a cache holding every account in the directory, each seeded
    /// with its durable timestamp. Accounts never observed stay unset; the
    /// epoch grace covers them without a record.
    ///
    /// Fails only if the directory cannot be listed.
    pub async fn load(
        store: DurableRecordStore,
        settings: DormantSettings,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let cache = Self::new(store, settings, clock);
        let ids = cache.store.list_accounts().await?;

        for id in &ids {
            let slot = cache.slot(*id);
            match cache.merger.merge(*id, None).await {
                Ok(outcome) => {
                    if let Some(seed) = outcome.reconciled {
                        slot.advance(seed);
                    }
                }
                Err(e) => {
                    warn!(account_id = %id, error = %e, "Failed to read activity timestamp");
                }
            }
        }

        info!(
            accounts = ids.len(),
            backend = cache.store.backend(),
            "Loaded activity cache"
        );
        Ok(cache)
    }

    /// The settings this cache was built with.
    pub fn settings(&self) -> &DormantSettings {
        &self.settings
    }

    /// Number of accounts held.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no account is held.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether an account is in the active set.
    pub fn in_active_set(&self, id: AccountId) -> bool {
        self.active.contains(&id)
    }

    /// Record activity for `id` at the current time, then reactivate the
    /// account if it was not believed active. Never fails; store errors are
    /// logged.
    pub async fn mark_active(&self, id: AccountId) {
        let now = self.clock.now();
        let slot = self.slot(id);
        slot.advance(now);

        if self.active.contains(&id) {
            return;
        }

        let _guard = slot.guard.lock().await;
        if let Err(e) = self.transition(id).await {
            error!(account_id = %id, error = %e, "Failed to update status after activity");
        }
    }

    /// Whether `id` has been active within the dormant period, or the
    /// deployment itself is younger than the dormant period.
    pub fn is_active(&self, id: AccountId) -> bool {
        let window_start = self.settings.window_start(self.clock.now());
        let recent = self
            .last_active(id)
            .is_some_and(|last_active| last_active > window_start);
        recent || self.settings.epoch > window_start
    }

    /// Last recorded activity of `id`, if any.
    pub fn last_active(&self, id: AccountId) -> Option<DateTime<Utc>> {
        self.slots.get(&id).and_then(|slot| slot.get())
    }

    /// Snapshot of all accounts with recorded activity, most recently active
    /// first; ties are ordered by account id.
    pub fn all_users(&self) -> Vec<(AccountId, DateTime<Utc>)> {
        let mut users: Vec<(AccountId, DateTime<Utc>)> = self
            .slots
            .iter()
            .filter_map(|entry| entry.value().get().map(|at| (*entry.key(), at)))
            .collect();
        users.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        users
    }

    /// Reconcile every held account with the durable store and recompute its
    /// status. A failure on one account is logged and the pass continues.
    pub async fn sync(&self) -> SyncReport {
        let slots: Vec<(AccountId, Arc<ActivitySlot>)> = self
            .slots
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        info!(accounts = slots.len(), "Synchronizing activity cache");
        let mut report = SyncReport {
            accounts: slots.len(),
            ..SyncReport::default()
        };

        for (id, slot) in slots {
            let _guard = slot.guard.lock().await;

            match self.merger.merge(id, slot.get()).await {
                Ok(outcome) => {
                    if outcome.written {
                        report.timestamps_written += 1;
                    }
                    if let Some(reconciled) = outcome.reconciled {
                        slot.advance(reconciled);
                    }
                }
                Err(e) => {
                    report.failures += 1;
                    error!(
                        account_id = %id,
                        backend = self.store.backend(),
                        error = %e,
                        "Failed to merge activity timestamp"
                    );
                }
            }

            match self.transition(id).await {
                Ok(Transition::Activate) => report.activated += 1,
                Ok(Transition::Deactivate) => report.deactivated += 1,
                Ok(Transition::Hold) => {}
                Err(e) => {
                    report.failures += 1;
                    error!(account_id = %id, error = %e, "Failed to update account status");
                }
            }
        }

        info!(%report, "Synchronized activity cache");
        report
    }

    /// Rebuild the active set from the durable status of every held
    /// account. Returns how many accounts were added.
    pub async fn prime_active_set(&self) -> usize {
        let slots: Vec<(AccountId, Arc<ActivitySlot>)> = self
            .slots
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut added = 0;
        for (id, slot) in slots {
            let _guard = slot.guard.lock().await;
            match self.store.read_status(id).await {
                Ok(status) if !self.machine.is_dormant_status(status.as_deref()) => {
                    if self.active.insert(id) {
                        added += 1;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(account_id = %id, error = %e, "Failed to read account status");
                }
            }
        }
        debug!(added, "Primed active set");
        added
    }

    fn slot(&self, id: AccountId) -> Arc<ActivitySlot> {
        Arc::clone(
            self.slots
                .entry(id)
                .or_insert_with(|| Arc::new(ActivitySlot::new()))
                .value(),
        )
    }

    /// Apply the transition for `id`. The caller holds the account's guard.
    /// The active set changes only once the status write (if any) succeeded,
    /// so a failed write is retried by the next check.
    async fn transition(&self, id: AccountId) -> AppResult<Transition> {
        let transition = StatusStateMachine::decide(self.is_active(id), self.active.contains(&id));
        self.machine.apply(&self.store, id, transition).await?;
        match transition {
            Transition::Activate => {
                self.active.insert(id);
            }
            Transition::Deactivate => {
                self.active.remove(&id);
            }
            Transition::Hold => {}
        }
        Ok(transition)
    }
}
