//! `ls`: list accounts by last activity.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tabled::Tabled;

use dormant_core::error::AppError;
use dormant_core::types::{Account, AccountId};

use super::Context;
use crate::output::{self, OutputFormat};

/// Account display row for table and JSON output
#[derive(Debug, Serialize, Tabled)]
struct AccountRow {
    /// Last activity, truncated to seconds
    last_active: String,
    /// Account ID
    id: String,
    /// Display name
    name: String,
    /// Status
    status: String,
}

/// Execute the `ls` command
pub async fn execute(context: &Context, format: OutputFormat) -> Result<(), AppError> {
    let mut rows = Vec::new();
    for (id, last_active) in context.cache.all_users() {
        let account = context.store.account(id).await?;
        rows.push(row(id, last_active, account.as_ref()));
    }

    match format {
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", plain_line(row));
            }
        }
        OutputFormat::Table | OutputFormat::Json => output::print_list(&rows, format),
    }
    Ok(())
}

fn row(id: AccountId, last_active: DateTime<Utc>, account: Option<&Account>) -> AccountRow {
    AccountRow {
        last_active: last_active.to_rfc3339_opts(SecondsFormat::Secs, true),
        id: id.to_string(),
        name: account.map(|a| a.full_name.clone()).unwrap_or_default(),
        status: account
            .and_then(|a| a.visible_status())
            .unwrap_or_default()
            .to_string(),
    }
}

/// `timestamp \t id \t name[ (status)]`
fn plain_line(row: &AccountRow) -> String {
    let mut line = format!("{}\t{}\t{}", row.last_active, row.id, row.name);
    if !row.status.is_empty() {
        line.push_str(&format!(" ({})", row.status));
    }
    line
}
