//! File-backed account directory with an identity-keyed read cache.
//!
//! Accounts are stored as a JSON array in a single file. Lookups are served
//! from a `moka` cache; [`evict`](AccountDirectory::evict) drops one entry so
//! the next lookup re-reads the file.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use dormant_core::config::storage::StorageConfig;
use dormant_core::error::{AppError, ErrorKind};
use dormant_core::result::AppResult;
use dormant_core::traits::AccountDirectory;
use dormant_core::types::{Account, AccountId};

/// Account directory persisted as a JSON file.
#[derive(Debug)]
pub struct FileAccountDirectory {
    /// Path of the accounts file.
    path: PathBuf,
    /// Cached account records.
    cache: Cache<AccountId, Account>,
    /// Serializes read-modify-write cycles on the accounts file.
    write_lock: Mutex<()>,
}

impl FileAccountDirectory {
    /// Create a directory over the given file.
    pub fn new(path: impl Into<PathBuf>, cache_capacity: u64, cache_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(cache_capacity)
            .time_to_live(cache_ttl)
            .build();
        Self {
            path: path.into(),
            cache,
            write_lock: Mutex::new(()),
        }
    }

    /// Create a directory from the storage configuration.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            config.accounts_path(),
            config.account_cache_capacity,
            Duration::from_secs(config.account_cache_ttl_seconds),
        )
    }

    /// Whether an account is currently held in the read cache.
    pub fn is_cached(&self, id: AccountId) -> bool {
        self.cache.contains_key(&id)
    }

    async fn load_all(&self) -> AppResult<Vec<Account>> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Directory,
                    format!("Failed to read accounts file: {}", self.path.display()),
                    e,
                ));
            }
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn save_all(&self, accounts: &[Account]) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(accounts)?;
        let tmp = self
            .path
            .with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp, text.as_bytes()).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AppError::with_source(
                ErrorKind::Directory,
                format!("Failed to replace accounts file: {}", self.path.display()),
                e,
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountDirectory for FileAccountDirectory {
    async fn list_accounts(&self) -> AppResult<Vec<AccountId>> {
        Ok(self.load_all().await?.into_iter().map(|a| a.id).collect())
    }

    async fn get(&self, id: AccountId) -> AppResult<Option<Account>> {
        if let Some(account) = self.cache.get(&id).await {
            return Ok(Some(account));
        }
        let account = self.load_all().await?.into_iter().find(|a| a.id == id);
        if let Some(account) = &account {
            self.cache.insert(id, account.clone()).await;
        }
        Ok(account)
    }

    async fn update_status(&self, id: AccountId, status: &str) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut accounts = self.load_all().await?;
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::not_found(format!("Account {id} not found")))?;
        account.status = Some(status.to_string());
        self.save_all(&accounts).await?;
        debug!(account_id = %id, status, "Updated account status");
        Ok(())
    }

    async fn evict(&self, id: AccountId) -> AppResult<()> {
        self.cache.invalidate(&id).await;
        Ok(())
    }
}
