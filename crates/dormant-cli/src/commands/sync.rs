//! `sync`: run one reconciliation pass.

use dormant_core::error::AppError;

use super::Context;
use crate::output::{self, OutputFormat};

/// Execute the sync command
pub async fn execute(context: &Context, format: OutputFormat) -> Result<(), AppError> {
    context.cache.prime_active_set().await;
    let report = context.cache.sync().await;

    match format {
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Plain | OutputFormat::Table => {
            output::print_success(&format!("Synchronized {} accounts", report.accounts));
            output::print_kv("Timestamps written", &report.timestamps_written.to_string());
            output::print_kv("Activated", &report.activated.to_string());
            output::print_kv("Deactivated", &report.deactivated.to_string());
            output::print_kv("Failures", &report.failures.to_string());
        }
    }
    Ok(())
}
