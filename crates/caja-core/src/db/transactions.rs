//! Transaction operations
//!
//! Includes the PLANIFICADA -> REAL transition, dashboard summaries and the
//! per-cell detail report.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::info;

use super::{format_timestamp, parse_datetime, parse_decimal, parse_enum, parse_timestamp, Database};
use crate::error::{Error, Result};
use crate::models::{
    NewTransaction, Transaction, TransactionDetail, TransactionState, TransactionSummary,
};

const TRANSACTION_COLUMNS: &str = "t.id, t.user_id, t.description, t.amount, t.currency, \
     t.direction, t.state, t.date, t.planned_date, t.entity_id, t.bank_account_id, \
     t.ledger_account_id, t.created_at";

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let amount: String = row.get(3)?;
    let currency: String = row.get(4)?;
    let direction: String = row.get(5)?;
    let state: String = row.get(6)?;
    let date: String = row.get(7)?;
    let planned_date: Option<String> = row.get(8)?;
    let created_at: String = row.get(12)?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        description: row.get(2)?,
        amount: parse_decimal(3, &amount)?,
        currency: parse_enum(4, &currency)?,
        direction: parse_enum(5, &direction)?,
        state: parse_enum(6, &state)?,
        date: parse_timestamp(7, &date)?,
        planned_date: planned_date
            .map(|s| parse_timestamp(8, &s))
            .transpose()?,
        entity_id: row.get(9)?,
        bank_account_id: row.get(10)?,
        ledger_account_id: row.get(11)?,
        created_at: parse_datetime(&created_at),
    })
}

/// Filter for the per-cell detail report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionReportFilter {
    pub entity_id: i64,
    pub bank_account_id: i64,
    /// Include PLANIFICADA rows alongside REAL ones
    pub include_planned: bool,
}

impl Database {
    /// Record a transaction
    ///
    /// Referenced entity, bank account and ledger account must belong to the
    /// user (else `NotFound`) and be active (else `Validation`).
    pub fn create_transaction(&self, user_id: &str, new: &NewTransaction) -> Result<Transaction> {
        let description = new.description.trim();
        if description.is_empty() {
            return Err(Error::Validation("Description is required".into()));
        }
        if new.amount <= Decimal::ZERO {
            return Err(Error::Validation("Amount must be greater than zero".into()));
        }

        let (date, planned_date) = match new.state {
            TransactionState::Planificada => {
                let planned = new.planned_date.ok_or_else(|| {
                    Error::Validation("Planned transactions require a planned date".into())
                })?;
                (planned, Some(planned))
            }
            TransactionState::Real => (new.date.unwrap_or_else(Utc::now), new.planned_date),
        };

        let entity = self
            .get_entity(user_id, new.entity_id)?
            .ok_or_else(|| Error::NotFound(format!("Entity {}", new.entity_id)))?;
        if !entity.active {
            return Err(Error::Validation(format!("Entity '{}' is inactive", entity.name)));
        }
        let account = self
            .get_bank_account(user_id, new.bank_account_id)?
            .ok_or_else(|| Error::NotFound(format!("Account {}", new.bank_account_id)))?;
        if !account.active {
            return Err(Error::Validation(format!("Account '{}' is inactive", account.name)));
        }
        let ledger = self
            .get_ledger_account(user_id, new.ledger_account_id)?
            .ok_or_else(|| Error::NotFound(format!("Ledger account {}", new.ledger_account_id)))?;
        if !ledger.active {
            return Err(Error::Validation(format!(
                "Ledger account '{}' is inactive",
                ledger.code
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO transactions
                (user_id, description, amount, currency, direction, state, date, planned_date,
                 entity_id, bank_account_id, ledger_account_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                description,
                new.amount.normalize().to_string(),
                new.currency.as_str(),
                new.direction.as_str(),
                new.state.as_str(),
                format_timestamp(&date),
                planned_date.as_ref().map(format_timestamp),
                new.entity_id,
                new.bank_account_id,
                new.ledger_account_id,
            ],
        )?;
        let id = conn.last_insert_rowid();

        self.get_transaction(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Transaction {}", id)))
    }

    /// Get a transaction by ID
    pub fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM transactions t WHERE t.id = ? AND t.user_id = ?",
                TRANSACTION_COLUMNS
            ),
            params![id, user_id],
            transaction_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// List transactions newest first, optionally restricted to one state
    pub fn list_transactions(
        &self,
        user_id: &str,
        state: Option<TransactionState>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM transactions t
            WHERE t.user_id = ?1 AND (?2 IS NULL OR t.state = ?2)
            ORDER BY t.date DESC, t.id DESC
            LIMIT ?3 OFFSET ?4
            "#,
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(
                params![user_id, state.map(|s| s.as_str()), limit, offset],
                transaction_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Every REAL transaction of the user, the balance aggregator's input
    pub fn list_realized_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions t WHERE t.user_id = ? AND t.state = 'REAL'",
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![user_id], transaction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Hard-delete a transaction
    pub fn delete_transaction(&self, user_id: &str, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM transactions WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("Transaction {}", id)));
        }
        Ok(())
    }

    /// Transition a PLANIFICADA transaction to REAL
    ///
    /// Stamps `date` with `realized_at` (or now) and leaves `planned_date`
    /// untouched. The state check and the update are one statement, so a
    /// second confirmation always sees zero affected rows. Missing, foreign
    /// and already-realized transactions all fail with the same `NotFound`.
    pub fn confirm_realized(
        &self,
        user_id: &str,
        id: i64,
        realized_at: Option<DateTime<Utc>>,
    ) -> Result<Transaction> {
        let realized_at = realized_at.unwrap_or_else(Utc::now);
        let conn = self.conn()?;

        let changed = conn.execute(
            r#"
            UPDATE transactions
            SET state = ?1, date = ?2
            WHERE id = ?3 AND user_id = ?4 AND state = ?5
            "#,
            params![
                TransactionState::Real.as_str(),
                format_timestamp(&realized_at),
                id,
                user_id,
                TransactionState::Planificada.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!(
                "Transaction {} not found or already realized",
                id
            )));
        }

        info!(user = %user_id, transaction_id = id, "Transaction marked as realized");

        self.get_transaction(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Transaction {}", id)))
    }

    /// Most recent transactions with referenced names flattened in
    pub fn recent_transaction_summaries(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<TransactionSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, t.description, t.amount, t.currency, t.direction, t.state,
                   t.date, t.planned_date, e.name, b.name, l.code || ' - ' || l.name
            FROM transactions t
            JOIN entities e ON e.id = t.entity_id
            JOIN bank_accounts b ON b.id = t.bank_account_id
            JOIN ledger_accounts l ON l.id = t.ledger_account_id
            WHERE t.user_id = ?
            ORDER BY t.date DESC, t.id DESC
            LIMIT ?
            "#,
        )?;

        let summaries = stmt
            .query_map(params![user_id, limit], |row| {
                let amount: String = row.get(2)?;
                let currency: String = row.get(3)?;
                let direction: String = row.get(4)?;
                let state: String = row.get(5)?;
                let date: String = row.get(6)?;
                let planned_date: Option<String> = row.get(7)?;
                Ok(TransactionSummary {
                    id: row.get(0)?,
                    description: row.get(1)?,
                    amount: parse_decimal(2, &amount)?,
                    currency: parse_enum(3, &currency)?,
                    direction: parse_enum(4, &direction)?,
                    state: parse_enum(5, &state)?,
                    date: parse_timestamp(6, &date)?,
                    planned_date: planned_date
                        .map(|s| parse_timestamp(7, &s))
                        .transpose()?,
                    entity: row.get(8)?,
                    bank_account: row.get(9)?,
                    ledger_account: row.get(10)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(summaries)
    }

    /// Transactions of one (entity, bank account) cell with references expanded
    ///
    /// REAL only unless `include_planned`; newest first.
    pub fn report_transactions(
        &self,
        user_id: &str,
        filter: &TransactionReportFilter,
    ) -> Result<Vec<TransactionDetail>> {
        let entity = self
            .get_entity(user_id, filter.entity_id)?
            .ok_or_else(|| Error::NotFound(format!("Entity {}", filter.entity_id)))?;
        let bank_account = self
            .get_bank_account(user_id, filter.bank_account_id)?
            .ok_or_else(|| Error::NotFound(format!("Account {}", filter.bank_account_id)))?;
        let ledger: HashMap<i64, _> = self
            .list_ledger_accounts(user_id, true)?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM transactions t
            WHERE t.user_id = ?1 AND t.entity_id = ?2 AND t.bank_account_id = ?3
              AND (?4 OR t.state = 'REAL')
            ORDER BY t.date DESC, t.id DESC
            "#,
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(
                params![
                    user_id,
                    filter.entity_id,
                    filter.bank_account_id,
                    filter.include_planned
                ],
                transaction_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut details = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            let ledger_account = ledger
                .get(&transaction.ledger_account_id)
                .cloned()
                .ok_or_else(|| {
                    Error::InvalidData(format!(
                        "Transaction {} references missing ledger account {}",
                        transaction.id, transaction.ledger_account_id
                    ))
                })?;
            details.push(TransactionDetail {
                transaction,
                entity: entity.clone(),
                bank_account: bank_account.clone(),
                ledger_account,
            });
        }

        Ok(details)
    }

    /// PLANIFICADA transactions whose planned date is at or before `cutoff`
    ///
    /// Ordered by planned date, earliest first. Overdue ones are included.
    pub fn list_due_planned(&self, user_id: &str, cutoff: DateTime<Utc>) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM transactions t
            WHERE t.user_id = ? AND t.state = 'PLANIFICADA'
              AND t.planned_date IS NOT NULL AND t.planned_date <= ?
            ORDER BY t.planned_date ASC, t.id ASC
            "#,
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![user_id, format_timestamp(&cutoff)], transaction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }
}
