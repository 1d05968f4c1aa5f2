//! Durable record store facade.
//!
//! Pairs the per-account timestamp store with the account directory and
//! invalidates the directory's cache entry after every write it performs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use dormant_core::result::AppResult;
use dormant_core::traits::{AccountDirectory, TimestampStore};
use dormant_core::types::{Account, AccountId};

/// The durable side of activity tracking.
#[derive(Debug, Clone)]
pub struct DurableRecordStore {
    timestamps: Arc<dyn TimestampStore>,
    directory: Arc<dyn AccountDirectory>,
}

impl DurableRecordStore {
    /// Create a facade over a timestamp store and an account directory.
    pub fn new(timestamps: Arc<dyn TimestampStore>, directory: Arc<dyn AccountDirectory>) -> Self {
        Self {
            timestamps,
            directory,
        }
    }

    /// Every account known to the directory.
    pub async fn list_accounts(&self) -> AppResult<Vec<AccountId>> {
        self.directory.list_accounts().await
    }

    /// Look up an account through the directory cache.
    pub async fn account(&self, id: AccountId) -> AppResult<Option<Account>> {
        self.directory.get(id).await
    }

    /// Stored last-activity timestamp.
    pub async fn read_timestamp(&self, id: AccountId) -> AppResult<Option<DateTime<Utc>>> {
        self.timestamps.read_timestamp(id).await
    }

    /// Replace the stored last-activity timestamp.
    pub async fn write_timestamp(&self, id: AccountId, timestamp: DateTime<Utc>) -> AppResult<()> {
        self.timestamps.write_timestamp(id, timestamp).await?;
        self.invalidate(id).await;
        Ok(())
    }

    /// Current account status as seen by the directory.
    pub async fn read_status(&self, id: AccountId) -> AppResult<Option<String>> {
        self.directory.get_status(id).await
    }

    /// Replace the account status.
    pub async fn write_status(&self, id: AccountId, status: &str) -> AppResult<()> {
        self.directory.update_status(id, status).await?;
        self.invalidate(id).await;
        Ok(())
    }

    /// Name of the timestamp backend, for logs.
    pub fn backend(&self) -> &str {
        self.timestamps.backend()
    }

    async fn invalidate(&self, id: AccountId) {
        if let Err(e) = self.directory.evict(id).await {
            warn!(account_id = %id, error = %e, "Failed to evict account cache entry");
        }
    }
}
