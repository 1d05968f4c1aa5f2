//! Durable per-account timestamp record trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::result::AppResult;
use crate::types::AccountId;

/// Durable medium holding one last-activity timestamp per account.
///
/// Each call is its own transactional unit. Implementations report I/O
/// failures as `ErrorKind::Storage` and malformed stored values as
/// `ErrorKind::Serialization`.
#[async_trait]
pub trait TimestampStore: Send + Sync + std::fmt::Debug + 'static {
    /// Read the stored timestamp. Returns `None` if nothing was ever written.
    async fn read_timestamp(&self, id: AccountId) -> AppResult<Option<DateTime<Utc>>>;

    /// Replace the stored timestamp.
    async fn write_timestamp(&self, id: AccountId, timestamp: DateTime<Utc>) -> AppResult<()>;

    /// Short backend name used in logs.
    fn backend(&self) -> &str;
}
