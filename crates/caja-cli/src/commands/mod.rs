//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init) and shared utilities (open_db, require_ai)
//! - `entities` - Entity and bank account commands
//! - `ledger` - Chart of accounts commands, including AI generation and suggestion
//! - `prompts` - Prompt library management commands
//! - `reports` - Balance grid, balance detail and audit log
//! - `serve` - Web server command
//! - `transactions` - Transaction commands (list, add, confirm, due, delete)

pub mod core;
pub mod entities;
pub mod ledger;
pub mod prompts;
pub mod reports;
pub mod serve;
pub mod transactions;

// Re-export command functions for main.rs
pub use core::*;
pub use entities::*;
pub use ledger::*;
pub use prompts::*;
pub use reports::*;
pub use serve::*;
pub use transactions::*;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Parse a YYYY-MM-DD argument as noon of that day in `tz`
///
/// Noon keeps the calendar day stable when shown in nearby timezones.
pub fn parse_date_arg(value: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' (use YYYY-MM-DD)", value))?;
    let noon = date
        .and_hms_opt(12, 0, 0)
        .context("Invalid time of day")?;
    let local = tz
        .from_local_datetime(&noon)
        .earliest()
        .with_context(|| format!("Date '{}' does not exist in {}", value, tz))?;
    Ok(local.with_timezone(&Utc))
}
