//! `status`: show the active/dormant decision for one account.

use chrono::SecondsFormat;
use clap::Args;
use serde::Serialize;

use dormant_core::error::AppError;
use dormant_core::types::AccountId;

use super::Context;
use crate::output::{self, OutputFormat};

/// Arguments for the status command
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Account ID
    pub account_id: String,
}

/// Status report for one account
#[derive(Debug, Serialize)]
struct StatusReport {
    id: AccountId,
    name: String,
    last_active: Option<String>,
    active: bool,
    status: Option<String>,
}

/// Execute the status command
pub async fn execute(args: &StatusArgs, context: &Context, format: OutputFormat) -> Result<(), AppError> {
    let id: AccountId = args
        .account_id
        .parse()
        .map_err(|e| AppError::validation(format!("Invalid account ID '{}': {}", args.account_id, e)))?;

    let account = context
        .store
        .account(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Account '{}' not found", id)))?;

    let report = StatusReport {
        id,
        name: account.full_name.clone(),
        last_active: context
            .cache
            .last_active(id)
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        active: context.cache.is_active(id),
        status: account.visible_status().map(str::to_string),
    };

    match format {
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Plain | OutputFormat::Table => {
            output::print_kv("Account", &report.id.to_string());
            output::print_kv("Name", &report.name);
            output::print_kv(
                "Last active",
                report.last_active.as_deref().unwrap_or("never"),
            );
            output::print_kv("State", if report.active { "active" } else { "dormant" });
            output::print_kv("Status", report.status.as_deref().unwrap_or("-"));
        }
    }
    Ok(())
}
