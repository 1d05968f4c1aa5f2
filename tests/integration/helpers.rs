//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tempfile::TempDir;

use dormant_cache::ActivityCache;
use dormant_core::config::{AppConfig, DormantSettings};
use dormant_core::traits::ManualClock;
use dormant_core::types::{Account, AccountId};
use dormant_storage::{
    DurableRecordStore, FileAccountDirectory, LocalTimestampStore, MemoryAccountDirectory,
    MemoryTimestampStore,
};

/// Fixed starting instant for every test clock.
pub fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// A deployment laid out on disk under a temporary data root.
pub struct TestDeployment {
    /// Keeps the data root alive for the test's duration
    pub dir: TempDir,
    /// Configuration pointing at the data root
    pub config: AppConfig,
    /// Shared manual clock
    pub clock: Arc<ManualClock>,
    /// Accounts written to the accounts file
    pub accounts: Vec<Account>,
}

impl TestDeployment {
    /// Create a deployment with the named accounts.
    pub fn new(names: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut config = AppConfig::default();
        config.storage.data_root = dir.path().display().to_string();

        let accounts: Vec<Account> = names
            .iter()
            .map(|name| Account::new(AccountId::new(), *name))
            .collect();
        std::fs::write(
            config.storage.accounts_path(),
            serde_json::to_string(&accounts).unwrap(),
        )
        .expect("Failed to write accounts file");

        Self {
            dir,
            config,
            clock: Arc::new(ManualClock::new(start())),
            accounts,
        }
    }

    /// Id of the account with the given name.
    pub fn id(&self, name: &str) -> AccountId {
        self.accounts
            .iter()
            .find(|a| a.full_name == name)
            .map(|a| a.id)
            .expect("Unknown test account")
    }

    /// A fresh durable store over the deployment's files, as a new process
    /// would open it.
    pub async fn store(&self) -> DurableRecordStore {
        let timestamps = LocalTimestampStore::new(self.config.storage.activity_root())
            .await
            .expect("Failed to open timestamp store");
        let directory = FileAccountDirectory::from_config(&self.config.storage);
        DurableRecordStore::new(Arc::new(timestamps), Arc::new(directory))
    }

    /// Load a cache over the deployment, as process startup does.
    pub async fn load_cache(&self, settings: DormantSettings) -> Arc<ActivityCache> {
        let cache = ActivityCache::load(self.store().await, settings, self.clock.clone())
            .await
            .expect("Failed to load cache");
        cache.prime_active_set().await;
        Arc::new(cache)
    }

    /// Status currently recorded in the accounts file.
    pub async fn status(&self, name: &str) -> Option<String> {
        self.store()
            .await
            .read_status(self.id(name))
            .await
            .expect("Failed to read status")
    }

    /// Timestamp currently recorded on disk.
    pub async fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.store()
            .await
            .read_timestamp(self.id(name))
            .await
            .expect("Failed to read timestamp")
    }
}

/// Settings with a one-minute dormant period and a long-past epoch.
pub fn short_period_settings() -> DormantSettings {
    let mut settings = DormantSettings::with_defaults(start() - Duration::days(365));
    settings.dormant_period = Duration::minutes(1);
    settings
}

/// An in-memory deployment for timing-sensitive tests.
pub struct MemoryDeployment {
    pub timestamps: Arc<MemoryTimestampStore>,
    pub directory: Arc<MemoryAccountDirectory>,
    pub clock: Arc<ManualClock>,
}

impl MemoryDeployment {
    pub fn new() -> Self {
        Self {
            timestamps: Arc::new(MemoryTimestampStore::new()),
            directory: Arc::new(MemoryAccountDirectory::new()),
            clock: Arc::new(ManualClock::new(start())),
        }
    }

    pub fn account(&self, name: &str) -> AccountId {
        let id = AccountId::new();
        self.directory.insert(Account::new(id, name));
        id
    }

    pub async fn load_cache(&self, settings: DormantSettings) -> Arc<ActivityCache> {
        let store = DurableRecordStore::new(self.timestamps.clone(), self.directory.clone());
        let cache = ActivityCache::load(store, settings, self.clock.clone())
            .await
            .expect("Failed to load cache");
        cache.prime_active_set().await;
        Arc::new(cache)
    }
}
