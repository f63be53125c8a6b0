//! Balance grid, per-cell report and audit log

use anyhow::Result;
use caja_core::db::{Database, TransactionReportFilter};
use caja_core::models::Currency;

use super::truncate;

/// Print the entity × bank account grid, one line per currency bucket
pub fn cmd_balances(db: &Database, user: &str) -> Result<()> {
    let sheet = db.balance_sheet(user)?;

    if sheet.entidades.is_empty() || sheet.cuentas.is_empty() {
        println!("Add at least one entity and one bank account to see balances.");
        return Ok(());
    }

    println!();
    println!("💰 Balances (realized transactions only)");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:20} │ {:20} │ {:>14} │ {:>14}",
        "Entity", "Account", "ARS", "USD"
    );
    println!("   ─────────────────────┼──────────────────────┼────────────────┼───────────────");

    for (entity, row) in &sheet.saldos {
        for (account, balance) in row {
            println!(
                "   {:20} │ {:20} │ {:>14} │ {:>14}",
                truncate(entity, 20),
                truncate(account, 20),
                format!("{:.2}", balance.get(Currency::Ars)),
                format!("{:.2}", balance.get(Currency::Usd))
            );
        }
    }

    Ok(())
}

/// List the transactions behind one balance cell
pub fn cmd_report(
    db: &Database,
    user: &str,
    entity_id: i64,
    bank_account_id: i64,
    include_planned: bool,
) -> Result<()> {
    let details = db.report_transactions(
        user,
        &TransactionReportFilter {
            entity_id,
            bank_account_id,
            include_planned,
        },
    )?;

    if details.is_empty() {
        println!("No transactions for this entity and account.");
        return Ok(());
    }

    let first = &details[0];
    println!();
    println!(
        "📊 {} / {}",
        first.entity.name, first.bank_account.name
    );
    println!(
        "   {:>5} │ {:10} │ {:11} │ {:26} │ {:18} │ {:>14} │ {}",
        "ID", "Date", "State", "Description", "Ledger", "Amount", "Cur"
    );
    println!("   ──────┼────────────┼─────────────┼────────────────────────────┼────────────────────┼────────────────┼─────");

    for detail in &details {
        let tx = &detail.transaction;
        println!(
            "   {:>5} │ {:10} │ {:11} │ {:26} │ {:18} │ {:>14} │ {}",
            tx.id,
            tx.date.format("%Y-%m-%d"),
            tx.state.as_str(),
            truncate(&tx.description, 26),
            truncate(
                &format!("{} {}", detail.ledger_account.code, detail.ledger_account.name),
                18
            ),
            format!("{:.2}", tx.amount * tx.direction.multiplier()),
            tx.currency
        );
    }

    Ok(())
}

/// Show the most recent audit entries
pub fn cmd_audit(db: &Database, user: &str, limit: i64) -> Result<()> {
    let entries = db.list_audit_log(user, limit)?;

    if entries.is_empty() {
        println!("Audit log is empty.");
        return Ok(());
    }

    println!();
    println!("🔍 Audit log");
    for entry in entries {
        let target = match (entry.record_type.as_deref(), entry.record_id) {
            (Some(kind), Some(id)) => format!("{} #{}", kind, id),
            (Some(kind), None) => kind.to_string(),
            _ => String::new(),
        };
        println!(
            "   {} │ {:14} │ {:22} │ {}",
            entry.timestamp,
            entry.action,
            target,
            entry.details.unwrap_or_default()
        );
    }

    Ok(())
}
