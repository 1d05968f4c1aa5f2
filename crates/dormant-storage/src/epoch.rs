//! Deployment epoch persistence.
//!
//! The epoch is the first instant this deployment was seen. It is resolved
//! once at startup from, in order: the configured value, the state file,
//! or the current time (which is then written to the state file so later
//! restarts observe the same grace period).

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{error, info, warn};

use dormant_core::error::{AppError, ErrorKind};
use dormant_core::result::AppResult;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    epoch: Option<DateTime<Utc>>,
}

/// Reads and writes the deployment state file.
#[derive(Debug, Clone)]
pub struct EpochStore {
    path: PathBuf,
}

impl EpochStore {
    /// Create a store over the given state file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the persisted epoch, if any.
    pub async fn load(&self) -> AppResult<Option<DateTime<Utc>>> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read state file: {}", self.path.display()),
                    e,
                ));
            }
        };
        let state: StateFile = toml::from_str(&text)?;
        Ok(state.epoch)
    }

    /// Persist the epoch.
    pub async fn save(&self, epoch: DateTime<Utc>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let text = toml::to_string(&StateFile { epoch: Some(epoch) })?;
        fs::write(&self.path, text.as_bytes()).await?;
        Ok(())
    }

    /// The epoch a process would resolve, without recording a new one. Used
    /// by read-only tools; `None` means no epoch has been recorded yet.
    pub async fn current(&self, configured: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        if configured.is_some() {
            return configured;
        }
        match self.load().await {
            Ok(epoch) => epoch,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable state file");
                None
            }
        }
    }

    /// Resolve the deployment epoch. Never fails; problems are logged and
    /// the next source is tried.
    pub async fn resolve(
        &self,
        configured: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        if let Some(epoch) = configured {
            return epoch;
        }

        match self.load().await {
            Ok(Some(epoch)) => return epoch,
            Ok(None) => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Unreadable state file, starting a new epoch"
            ),
        }

        if let Err(e) = self.save(now).await {
            error!(
                path = %self.path.display(),
                error = %e,
                "Failed to persist epoch"
            );
        } else {
            info!(epoch = %now, "Recorded deployment epoch");
        }
        now
    }
}
