//! Account directory trait: the host's account store and its cache.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{Account, AccountId};

/// The host application's account directory.
///
/// Lookups are expected to go through an identity-keyed account cache;
/// [`evict`](AccountDirectory::evict) drops one entry from that cache so
/// the next lookup observes the backing store.
#[async_trait]
pub trait AccountDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// List every account known to the directory.
    async fn list_accounts(&self) -> AppResult<Vec<AccountId>>;

    /// Look up a single account. Returns `None` if the account does not exist.
    async fn get(&self, id: AccountId) -> AppResult<Option<Account>>;

    /// Current free-text status of an account.
    async fn get_status(&self, id: AccountId) -> AppResult<Option<String>> {
        Ok(self.get(id).await?.and_then(|account| account.status))
    }

    /// Atomically replace the status of an account in the backing store.
    async fn update_status(&self, id: AccountId, status: &str) -> AppResult<()>;

    /// Drop the cached entry for an account.
    async fn evict(&self, id: AccountId) -> AppResult<()>;
}
