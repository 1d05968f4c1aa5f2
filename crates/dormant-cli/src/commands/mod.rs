//! CLI command definitions and dispatch.
//!
//! Commands operate directly on the deployment's data root, so access is
//! governed by the filesystem permissions of that directory.

pub mod ls;
pub mod status;
pub mod sync;

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};

use dormant_cache::ActivityCache;
use dormant_core::config::{AppConfig, DormantSettings};
use dormant_core::error::AppError;
use dormant_core::traits::SystemClock;
use dormant_storage::{DurableRecordStore, EpochStore, FileAccountDirectory, LocalTimestampStore};

use crate::output::OutputFormat;

/// Dormant user tracking administration
#[derive(Debug, Parser)]
#[command(name = "dormant-cli", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List every account by last activity, most recent first
    Ls,
    /// Show whether one account is active or dormant
    Status(status::StatusArgs),
    /// Run one synchronization pass
    Sync,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = load_config(&self.config)?;
        let context = Context::open(&config).await?;

        match &self.command {
            Commands::Ls => ls::execute(&context, self.format).await,
            Commands::Status(args) => status::execute(args, &context, self.format).await,
            Commands::Sync => sync::execute(&context, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::from_file(Path::new(config_path))
        .map_err(|e| AppError::configuration(format!("Failed to load config: {}", e)))
}

/// Durable store and loaded cache shared by all commands.
#[derive(Debug)]
pub struct Context {
    /// Durable records, for account lookups.
    pub store: DurableRecordStore,
    /// Cache loaded from the durable records.
    pub cache: Arc<ActivityCache>,
}

impl Context {
    /// Open the configured stores and load the cache. The deployment epoch
    /// is only read; a deployment that never recorded one is evaluated as if
    /// it started now.
    pub async fn open(config: &AppConfig) -> Result<Self, AppError> {
        let timestamps = LocalTimestampStore::new(config.storage.activity_root()).await?;
        let directory = FileAccountDirectory::from_config(&config.storage);
        let store = DurableRecordStore::new(Arc::new(timestamps), Arc::new(directory));

        let epochs = EpochStore::new(config.storage.state_path());
        let epoch = match epochs.current(config.activity.configured_epoch()).await {
            Some(epoch) => epoch,
            None => {
                tracing::warn!("No deployment epoch recorded yet, using the current time");
                Utc::now()
            }
        };
        let settings = DormantSettings::resolve(&config.activity, epoch);
        tracing::debug!(%epoch, "Resolved activity settings");

        let cache = ActivityCache::load(store.clone(), settings, Arc::new(SystemClock)).await?;
        Ok(Self {
            store,
            cache: Arc::new(cache),
        })
    }
}
