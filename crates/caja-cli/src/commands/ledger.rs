//! Chart of accounts commands

use anyhow::Result;
use caja_core::ai::AIBackend;
use caja_core::db::Database;
use caja_core::models::NewLedgerAccount;
use caja_core::LedgerReconciler;

use super::truncate;

/// List ledger accounts ordered by code
pub fn cmd_ledger_list(db: &Database, user: &str, show_inactive: bool) -> Result<()> {
    let accounts = db.list_ledger_accounts(user, show_inactive)?;

    if accounts.is_empty() {
        println!("No ledger accounts yet. Generate a chart of accounts with:");
        println!("  caja ledger generate <activity>");
        return Ok(());
    }

    println!();
    println!("📒 Chart of accounts");
    println!("   ─────────────────────────────────────────────────────────────────");
    println!("   {:>4} │ {:8} │ {:24} │ {}", "ID", "Code", "Name", "Description");
    println!("   ─────┼──────────┼──────────────────────────┼──────────────────────");

    for account in accounts {
        let marker = if account.active { "" } else { " (inactive)" };
        println!(
            "   {:>4} │ {:8} │ {:24} │ {}{}",
            account.id,
            account.code,
            truncate(&account.name, 24),
            truncate(account.description.as_deref().unwrap_or("-"), 30),
            marker
        );
    }

    Ok(())
}

/// Add a ledger account by hand
pub fn cmd_ledger_add(
    db: &Database,
    user: &str,
    code: &str,
    name: &str,
    description: Option<&str>,
) -> Result<()> {
    let account = db.create_ledger_account(
        user,
        &NewLedgerAccount {
            code: code.to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
        },
    )?;
    db.log_audit(
        user,
        "create",
        Some("ledger_account"),
        Some(account.id),
        Some("cli"),
    )?;

    println!(
        "✅ Ledger account {} - {} created (id: {})",
        account.code, account.name, account.id
    );
    Ok(())
}

/// Deactivate a ledger account
pub fn cmd_ledger_remove(db: &Database, user: &str, id: i64) -> Result<()> {
    db.deactivate_ledger_account(user, id)?;
    db.log_audit(user, "deactivate", Some("ledger_account"), Some(id), Some("cli"))?;

    println!("✅ Ledger account {} deactivated", id);
    Ok(())
}

/// Generate a chart of accounts; codes the user already has are skipped
pub async fn cmd_ledger_generate(
    db: &Database,
    user: &str,
    ai: &dyn AIBackend,
    activity: &str,
) -> Result<()> {
    println!("🤖 Generating chart of accounts for '{}'...", activity.trim());
    println!("   Model: {} @ {}", ai.model(), ai.host());

    let outcome = LedgerReconciler::new(db, ai)
        .generate_chart_of_accounts(user, activity)
        .await?;

    db.log_audit(
        user,
        "generate",
        Some("ledger_account"),
        None,
        Some(&format!("cli, inserted={}", outcome.count())),
    )?;

    println!();
    if outcome.count() == 0 {
        println!("✅ All proposed ledger accounts already exist. Nothing to add.");
    } else {
        println!("✅ Created {} ledger accounts:", outcome.count());
        for account in &outcome.inserted {
            println!("   {:8} {}", account.code, account.name);
        }
    }
    if !outcome.skipped_codes.is_empty() {
        println!(
            "   Kept existing: {}",
            outcome.skipped_codes.join(", ")
        );
    }
    if outcome.discarded > 0 {
        println!(
            "   Discarded {} blank or repeated proposals",
            outcome.discarded
        );
    }

    Ok(())
}

/// Ask for a new ledger account proposal; nothing is saved
pub async fn cmd_ledger_suggest(
    db: &Database,
    user: &str,
    ai: &dyn AIBackend,
    purpose: &str,
    entity: Option<&str>,
    activity: Option<&str>,
) -> Result<()> {
    let proposal = LedgerReconciler::new(db, ai)
        .propose_new_account(user, purpose, entity, activity)
        .await?;

    println!("💡 Suggested ledger account:");
    println!("   Code:        {}", proposal.code);
    println!("   Name:        {}", proposal.name);
    if let Some(ref description) = proposal.description {
        println!("   Description: {}", description);
    }
    println!();
    println!("To create it:");
    println!(
        "  caja ledger add \"{}\" \"{}\"",
        proposal.code, proposal.name
    );

    Ok(())
}

/// Ask which existing ledger account fits a transaction description
pub async fn cmd_ledger_match(
    db: &Database,
    user: &str,
    ai: &dyn AIBackend,
    description: &str,
    entity: Option<&str>,
    activity: Option<&str>,
) -> Result<()> {
    let id = LedgerReconciler::new(db, ai)
        .match_existing_account(user, description, entity, activity)
        .await?;

    match db.get_ledger_account(user, id)? {
        Some(account) => println!(
            "💡 Best match: {} - {} (id: {})",
            account.code, account.name, account.id
        ),
        None => println!("💡 Best match: ledger account {}", id),
    }

    Ok(())
}
