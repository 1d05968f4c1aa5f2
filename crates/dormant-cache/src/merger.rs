//! Monotonic merge of an in-memory timestamp into the durable store.

use chrono::{DateTime, Utc};
use tracing::debug;

use dormant_core::result::AppResult;
use dormant_core::types::AccountId;
use dormant_storage::DurableRecordStore;

/// Result of merging one account's candidate timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The reconciled value: the newer of the candidate and the durable
    /// value, or `None` if neither exists.
    pub reconciled: Option<DateTime<Utc>>,
    /// Whether the candidate was written to the durable store.
    pub written: bool,
}

/// Reconciles in-memory candidates against durable timestamps.
///
/// The durable value never decreases: a candidate is written only when it is
/// strictly newer than what is stored. Callers serialize merges per account;
/// [`ActivityCache`](crate::ActivityCache) does so with each account's guard.
#[derive(Debug, Clone)]
pub struct TimestampMerger {
    store: DurableRecordStore,
}

impl TimestampMerger {
    /// Create a merger over the durable store.
    pub fn new(store: DurableRecordStore) -> Self {
        Self { store }
    }

    /// Merge `candidate` for `id`.
    ///
    /// A read failure aborts the merge before any write. A write failure is
    /// returned after the read; the durable value is then unchanged.
    pub async fn merge(
        &self,
        id: AccountId,
        candidate: Option<DateTime<Utc>>,
    ) -> AppResult<MergeOutcome> {
        let durable = self.store.read_timestamp(id).await?;

        let outcome = match (candidate, durable) {
            (None, durable) => MergeOutcome {
                reconciled: durable,
                written: false,
            },
            (Some(c), Some(d)) if c <= d => MergeOutcome {
                reconciled: Some(d),
                written: false,
            },
            (Some(c), _) => {
                self.store.write_timestamp(id, c).await?;
                debug!(account_id = %id, timestamp = %c, "Persisted newer activity timestamp");
                MergeOutcome {
                    reconciled: Some(c),
                    written: true,
                }
            }
        };
        Ok(outcome)
    }
}
