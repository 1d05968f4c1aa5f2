//! Dormant user tracking server.
//!
//! Main entry point that wires the storage, cache, and worker crates
//! together, feeds activity events into the cache, and flushes it on
//! shutdown.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt};

use dormant_cache::{ActivityCache, ActivityListener};
use dormant_core::config::{AppConfig, DormantSettings};
use dormant_core::error::AppError;
use dormant_core::events::ActivityEvent;
use dormant_core::traits::SystemClock;
use dormant_storage::{DurableRecordStore, EpochStore, FileAccountDirectory, LocalTimestampStore};
use dormant_worker::SyncLifecycle;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    if let Ok(path) = std::env::var("DORMANT_CONFIG") {
        return AppConfig::from_file(Path::new(&path));
    }
    let env = std::env::var("DORMANT_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting dormant user tracking v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Create data directories ──────────────────────────
    let data_root = config.storage.data_root();
    tokio::fs::create_dir_all(&data_root).await.map_err(|e| {
        AppError::internal(format!(
            "Failed to create data root '{}': {}",
            data_root.display(),
            e
        ))
    })?;

    // ── Step 2: Durable stores ───────────────────────────────────
    let timestamps = LocalTimestampStore::new(config.storage.activity_root()).await?;
    let directory = FileAccountDirectory::from_config(&config.storage);
    let store = DurableRecordStore::new(Arc::new(timestamps), Arc::new(directory));
    tracing::info!(
        accounts_file = %config.storage.accounts_path().display(),
        backend = store.backend(),
        "Durable stores ready"
    );

    // ── Step 3: Resolve settings ─────────────────────────────────
    let epoch = EpochStore::new(config.storage.state_path())
        .resolve(config.activity.configured_epoch(), Utc::now())
        .await;
    let settings = DormantSettings::resolve(&config.activity, epoch);
    tracing::debug!(?settings, "Resolved activity settings");

    // ── Step 4: Load activity cache ──────────────────────────────
    let cache = Arc::new(ActivityCache::load(store, settings.clone(), Arc::new(SystemClock)).await?);
    let primed = cache.prime_active_set().await;
    tracing::info!(accounts = cache.len(), active = primed, "Activity cache ready");

    // ── Step 5: Start periodic sync ──────────────────────────────
    let lifecycle = SyncLifecycle::from_config(Arc::clone(&cache), &settings, &config.scheduler);
    if config.scheduler.enabled {
        lifecycle.start();
    } else {
        tracing::info!("Periodic activity sync disabled");
    }

    // ── Step 6: Activity event intake ────────────────────────────
    let listener = ActivityListener::new(Arc::clone(&cache));
    let intake = tokio::spawn(read_events(listener));

    // ── Step 7: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, flushing activity cache...");
    intake.abort();

    match lifecycle.stop().await {
        Some(report) => tracing::info!(%report, "Final activity sync complete"),
        None => tracing::warn!("Final activity sync did not complete"),
    }

    tracing::info!("Dormant user tracking shut down gracefully");
    Ok(())
}

/// Read newline-delimited JSON activity events from stdin until EOF
async fn read_events(listener: ActivityListener) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match serde_json::from_str::<ActivityEvent>(&line) {
                Ok(event) => listener.on_event(&event).await,
                Err(e) => tracing::warn!(error = %e, "Ignoring malformed activity event"),
            },
            Ok(None) => {
                tracing::debug!("Activity event input closed");
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read activity events");
                break;
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
