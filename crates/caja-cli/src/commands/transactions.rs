//! Transaction command implementations

use anyhow::{anyhow, Result};
use caja_core::datetime::due_cutoff;
use caja_core::db::Database;
use caja_core::models::{Currency, Direction, NewTransaction, Transaction, TransactionState};
use chrono::Utc;
use chrono_tz::Tz;
use rust_decimal::Decimal;

use super::{parse_date_arg, truncate};

/// Arguments of `caja transactions add`
pub struct TransactionArgs<'a> {
    pub description: &'a str,
    pub amount: Decimal,
    pub currency: &'a str,
    pub direction: &'a str,
    pub entity_id: i64,
    pub bank_account_id: i64,
    pub ledger_account_id: i64,
    /// Planned date; when set the transaction starts as PLANIFICADA
    pub planned: Option<&'a str>,
    /// Realization date for a REAL transaction
    pub date: Option<&'a str>,
}

fn print_transaction_table(transactions: &[Transaction], tz: Tz) {
    println!(
        "   {:>5} │ {:10} │ {:11} │ {:30} │ {:>14} │ {}",
        "ID", "Date", "State", "Description", "Amount", "Cur"
    );
    println!("   ──────┼────────────┼─────────────┼────────────────────────────────┼────────────────┼─────");

    for tx in transactions {
        let signed = tx.amount * tx.direction.multiplier();
        println!(
            "   {:>5} │ {:10} │ {:11} │ {:30} │ {:>14} │ {}",
            tx.id,
            tx.date.with_timezone(&tz).format("%Y-%m-%d"),
            tx.state.as_str(),
            truncate(&tx.description, 30),
            format!("{:.2}", signed),
            tx.currency
        );
    }
}

/// List transactions newest first
pub fn cmd_transactions_list(
    db: &Database,
    user: &str,
    limit: i64,
    state: Option<&str>,
) -> Result<()> {
    let state = state
        .map(|s| s.parse::<TransactionState>())
        .transpose()
        .map_err(|e| anyhow!(e))?;
    let transactions = db.list_transactions(user, state, limit, 0)?;

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!();
    println!("📋 Transactions");
    print_transaction_table(&transactions, caja_core::datetime::timezone_from_env());

    Ok(())
}

/// Record a transaction, REAL by default or PLANIFICADA when a planned date is given
pub fn cmd_transactions_add(
    db: &Database,
    user: &str,
    tz: Tz,
    args: TransactionArgs<'_>,
) -> Result<()> {
    let currency: Currency = args.currency.parse().map_err(|e: String| anyhow!(e))?;
    let direction: Direction = args.direction.parse().map_err(|e: String| anyhow!(e))?;

    let planned_date = args.planned.map(|d| parse_date_arg(d, tz)).transpose()?;
    let date = args.date.map(|d| parse_date_arg(d, tz)).transpose()?;
    let state = if planned_date.is_some() {
        TransactionState::Planificada
    } else {
        TransactionState::Real
    };

    let tx = db.create_transaction(
        user,
        &NewTransaction {
            description: args.description.to_string(),
            amount: args.amount,
            currency,
            direction,
            state,
            date,
            planned_date,
            entity_id: args.entity_id,
            bank_account_id: args.bank_account_id,
            ledger_account_id: args.ledger_account_id,
        },
    )?;
    db.log_audit(user, "create", Some("transaction"), Some(tx.id), Some("cli"))?;

    match tx.state {
        TransactionState::Planificada => println!(
            "🗓️  Planned transaction {} for {}: {} {} {}",
            tx.id,
            tx.date.with_timezone(&tz).format("%Y-%m-%d"),
            tx.direction,
            tx.amount,
            tx.currency
        ),
        TransactionState::Real => println!(
            "✅ Transaction {} recorded: {} {} {}",
            tx.id, tx.direction, tx.amount, tx.currency
        ),
    }

    Ok(())
}

/// Mark a planned transaction as realized
pub fn cmd_transactions_confirm(
    db: &Database,
    user: &str,
    tz: Tz,
    id: i64,
    date: Option<&str>,
) -> Result<()> {
    let realized_at = date.map(|d| parse_date_arg(d, tz)).transpose()?;
    let tx = db.confirm_realized(user, id, realized_at)?;
    db.log_audit(user, "mark_realized", Some("transaction"), Some(id), Some("cli"))?;

    println!(
        "✅ Transaction {} realized on {}",
        tx.id,
        tx.date.with_timezone(&tz).format("%Y-%m-%d")
    );
    Ok(())
}

/// List planned transactions due within `days`, overdue ones included
pub fn cmd_transactions_due(db: &Database, user: &str, tz: Tz, days: u32) -> Result<()> {
    let cutoff = due_cutoff(Utc::now(), tz, days);
    let due = db.list_due_planned(user, cutoff)?;

    if due.is_empty() {
        println!("Nothing due in the next {} days.", days);
        return Ok(());
    }

    println!();
    println!("⏰ Due in the next {} days ({})", days, tz);
    print_transaction_table(&due, tz);
    println!();
    println!("Confirm one with: caja transactions confirm <id>");

    Ok(())
}

/// Delete a transaction
pub fn cmd_transactions_delete(db: &Database, user: &str, id: i64) -> Result<()> {
    db.delete_transaction(user, id)?;
    db.log_audit(user, "delete", Some("transaction"), Some(id), Some("cli"))?;

    println!("✅ Transaction {} deleted", id);
    Ok(())
}
