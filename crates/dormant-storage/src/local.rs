//! Local filesystem timestamp store.
//!
//! Each account owns one small TOML record:
//!
//! ```text
//! {root}/{shard}/{account-id}/activity.toml
//!
//! [activity]
//! last_activity = "2024-05-01T12:00:00Z"
//! ```
//!
//! Writes go to a temporary sibling file that is renamed over the record,
//! so readers never observe a partially written file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use dormant_core::error::{AppError, ErrorKind};
use dormant_core::result::AppResult;
use dormant_core::traits::TimestampStore;
use dormant_core::types::AccountId;

const RECORD_FILE: &str = "activity.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ActivityRecord {
    #[serde(default)]
    activity: ActivitySection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ActivitySection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_activity: Option<DateTime<Utc>>,
}

/// Timestamp store keeping one TOML record per account on local disk.
#[derive(Debug, Clone)]
pub struct LocalTimestampStore {
    /// Root directory for all activity records.
    root: PathBuf,
}

impl LocalTimestampStore {
    /// Create a store rooted at the given path, creating it if needed.
    pub async fn new(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create activity root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Path of the record file for an account.
    pub fn record_path(&self, id: AccountId) -> PathBuf {
        self.root
            .join(id.shard())
            .join(id.to_string())
            .join(RECORD_FILE)
    }

    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create record directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl TimestampStore for LocalTimestampStore {
    async fn read_timestamp(&self, id: AccountId) -> AppResult<Option<DateTime<Utc>>> {
        let path = self.record_path(id);
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read activity record for {id}"),
                    e,
                ));
            }
        };

        let record: ActivityRecord = toml::from_str(&text).map_err(|e| {
            AppError::with_source(
                ErrorKind::Serialization,
                format!("Malformed activity record for {id}"),
                e,
            )
        })?;
        Ok(record.activity.last_activity)
    }

    async fn write_timestamp(&self, id: AccountId, timestamp: DateTime<Utc>) -> AppResult<()> {
        let path = self.record_path(id);
        self.ensure_parent(&path).await?;

        let record = ActivityRecord {
            activity: ActivitySection {
                last_activity: Some(timestamp),
            },
        };
        let text = toml::to_string(&record)?;

        let tmp = path.with_extension(format!("toml.{}.tmp", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp, text.as_bytes()).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write activity record for {id}"),
                e,
            )
        })?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to commit activity record for {id}"),
                e,
            ));
        }

        debug!(account_id = %id, timestamp = %timestamp, "Wrote activity record");
        Ok(())
    }

    fn backend(&self) -> &str {
        "local"
    }
}
