//! In-memory timestamp store and account directory.
//!
//! Used for tests and for embedding the tracker where nothing needs to
//! survive the process. Both keep operation counters and can be told to
//! fail, so callers can assert on durable I/O and exercise failure paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use dormant_core::error::AppError;
use dormant_core::result::AppResult;
use dormant_core::traits::{AccountDirectory, TimestampStore};
use dormant_core::types::{Account, AccountId};

/// Timestamp store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryTimestampStore {
    values: DashMap<AccountId, DateTime<Utc>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryTimestampStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored value without counting it as a write.
    pub fn seed(&self, id: AccountId, timestamp: DateTime<Utc>) {
        self.values.insert(id, timestamp);
    }

    /// The stored value, bypassing counters and failure injection.
    pub fn peek(&self, id: AccountId) -> Option<DateTime<Utc>> {
        self.values.get(&id).map(|v| *v)
    }

    /// Number of reads served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make subsequent reads fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TimestampStore for MemoryTimestampStore {
    async fn read_timestamp(&self, id: AccountId) -> AppResult<Option<DateTime<Utc>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::storage(format!(
                "Injected read failure for {id}"
            )));
        }
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.peek(id))
    }

    async fn write_timestamp(&self, id: AccountId, timestamp: DateTime<Utc>) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::storage(format!(
                "Injected write failure for {id}"
            )));
        }
        self.values.insert(id, timestamp);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn backend(&self) -> &str {
        "memory"
    }
}

/// Account directory backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryAccountDirectory {
    accounts: DashMap<AccountId, Account>,
    status_writes: AtomicUsize,
    evictions: AtomicUsize,
    fail_updates: AtomicBool,
}

impl MemoryAccountDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an account.
    pub fn insert(&self, account: Account) {
        self.accounts.insert(account.id, account);
    }

    /// Current status of an account, bypassing counters.
    pub fn status(&self, id: AccountId) -> Option<String> {
        self.accounts.get(&id).and_then(|a| a.status.clone())
    }

    /// Number of successful status updates so far.
    pub fn status_write_count(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    /// Number of cache evictions requested so far.
    pub fn eviction_count(&self) -> usize {
        self.evictions.load(Ordering::SeqCst)
    }

    /// Make subsequent status updates fail.
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountDirectory for MemoryAccountDirectory {
    async fn list_accounts(&self) -> AppResult<Vec<AccountId>> {
        let mut ids: Vec<AccountId> = self.accounts.iter().map(|e| *e.key()).collect();
        ids.sort();
        Ok(ids)
    }

    async fn get(&self, id: AccountId) -> AppResult<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn update_status(&self, id: AccountId, status: &str) -> AppResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::directory(format!(
                "Injected status update failure for {id}"
            )));
        }
        let mut account = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Account {id} not found")))?;
        account.status = Some(status.to_string());
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn evict(&self, _id: AccountId) -> AppResult<()> {
        self.evictions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
