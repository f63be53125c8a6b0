//! Chart of accounts ("asientos")
//!
//! The code is the per-user dedup key. Existing codes are never overwritten:
//! batch inserts skip them and manual creation rejects them.

use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{LedgerAccount, NewLedgerAccount};

const LEDGER_COLUMNS: &str = "id, user_id, code, name, description, active, created_at";

fn ledger_from_row(row: &Row<'_>) -> rusqlite::Result<LedgerAccount> {
    let created_at_str: String = row.get(6)?;
    Ok(LedgerAccount {
        id: row.get(0)?,
        user_id: row.get(1)?,
        code: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        active: row.get(5)?,
        created_at: parse_datetime(&created_at_str),
    })
}

fn query_ledger_account(
    conn: &Connection,
    user_id: &str,
    id: i64,
) -> rusqlite::Result<Option<LedgerAccount>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM ledger_accounts WHERE id = ? AND user_id = ?",
            LEDGER_COLUMNS
        ),
        params![id, user_id],
        ledger_from_row,
    )
    .optional()
}

fn query_codes(conn: &Connection, user_id: &str) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT code FROM ledger_accounts WHERE user_id = ?")?;
    let codes = stmt
        .query_map(params![user_id], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<HashSet<_>, _>>()?;
    Ok(codes)
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
}

/// Outcome of a batch insert
#[derive(Debug, Clone, Default)]
pub struct LedgerBatchResult {
    /// Rows actually written, in proposal order
    pub inserted: Vec<LedgerAccount>,
    /// Proposed codes that already existed for the user
    pub skipped_codes: Vec<String>,
}

impl Database {
    /// Create a single ledger account
    ///
    /// Inactive rows still hold their code, so reusing one is rejected too.
    pub fn create_ledger_account(
        &self,
        user_id: &str,
        account: &NewLedgerAccount,
    ) -> Result<LedgerAccount> {
        let code = account.code.trim();
        let name = account.name.trim();
        if code.is_empty() || name.is_empty() {
            return Err(Error::Validation(
                "Ledger account code and name are required".into(),
            ));
        }

        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO ledger_accounts (user_id, code, name, description) VALUES (?, ?, ?, ?)",
            params![
                user_id,
                code,
                name,
                normalize_description(account.description.as_deref())
            ],
        )?;

        if inserted == 0 {
            return Err(Error::Validation(format!(
                "A ledger account with code '{}' already exists",
                code
            )));
        }

        let id = conn.last_insert_rowid();
        query_ledger_account(&conn, user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Ledger account {}", id)))
    }

    /// Get a ledger account by ID
    pub fn get_ledger_account(&self, user_id: &str, id: i64) -> Result<Option<LedgerAccount>> {
        let conn = self.conn()?;
        Ok(query_ledger_account(&conn, user_id, id)?)
    }

    /// List a user's ledger accounts ordered by code
    pub fn list_ledger_accounts(
        &self,
        user_id: &str,
        include_inactive: bool,
    ) -> Result<Vec<LedgerAccount>> {
        let conn = self.conn()?;
        let query = if include_inactive {
            format!(
                "SELECT {} FROM ledger_accounts WHERE user_id = ? ORDER BY code",
                LEDGER_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM ledger_accounts WHERE user_id = ? AND active = 1 ORDER BY code",
                LEDGER_COLUMNS
            )
        };

        let mut stmt = conn.prepare(&query)?;
        let accounts = stmt
            .query_map(params![user_id], ledger_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Every code the user holds, active or not
    pub fn list_ledger_codes(&self, user_id: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT code FROM ledger_accounts WHERE user_id = ? ORDER BY code")?;
        let codes = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(codes)
    }

    /// Update name and description; the code cannot change
    pub fn update_ledger_account(
        &self,
        user_id: &str,
        id: i64,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<LedgerAccount> {
        let conn = self.conn()?;
        let current = query_ledger_account(&conn, user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Ledger account {}", id)))?;

        let name = match name.map(str::trim) {
            Some("") => {
                return Err(Error::Validation("Ledger account name is required".into()))
            }
            Some(n) => n.to_string(),
            None => current.name,
        };
        let description = match description {
            Some(d) => normalize_description(Some(d)),
            None => current.description,
        };

        conn.execute(
            "UPDATE ledger_accounts SET name = ?, description = ? WHERE id = ? AND user_id = ?",
            params![name, description, id, user_id],
        )?;

        query_ledger_account(&conn, user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Ledger account {}", id)))
    }

    /// Soft-delete a ledger account (active = false)
    pub fn deactivate_ledger_account(&self, user_id: &str, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE ledger_accounts SET active = 0 WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("Ledger account {}", id)));
        }
        Ok(())
    }

    /// Insert the proposals whose code the user does not hold yet
    ///
    /// The existing-code read and the inserts share one `BEGIN IMMEDIATE`
    /// transaction, so two concurrent batches for the same user serialize.
    /// `INSERT OR IGNORE` turns any remaining collision into a skip.
    /// Existing rows are never touched.
    pub fn insert_ledger_accounts_batch(
        &self,
        user_id: &str,
        proposals: &[NewLedgerAccount],
    ) -> Result<LedgerBatchResult> {
        let conn = self.conn()?;

        conn.execute_batch("BEGIN IMMEDIATE")?;

        let result: Result<LedgerBatchResult> = (|| {
            let existing = query_codes(&conn, user_id)?;
            let mut batch = LedgerBatchResult::default();

            if proposals.iter().all(|p| existing.contains(p.code.trim())) {
                batch.skipped_codes = proposals.iter().map(|p| p.code.clone()).collect();
                return Ok(batch);
            }

            let mut stmt = conn.prepare(
                "INSERT OR IGNORE INTO ledger_accounts (user_id, code, name, description) VALUES (?, ?, ?, ?)",
            )?;

            for proposal in proposals {
                let code = proposal.code.trim();
                if existing.contains(code) {
                    batch.skipped_codes.push(code.to_string());
                    continue;
                }

                let changed = stmt.execute(params![
                    user_id,
                    code,
                    proposal.name.trim(),
                    normalize_description(proposal.description.as_deref())
                ])?;
                if changed == 0 {
                    batch.skipped_codes.push(code.to_string());
                    continue;
                }

                let id = conn.last_insert_rowid();
                if let Some(account) = query_ledger_account(&conn, user_id, id)? {
                    batch.inserted.push(account);
                }
            }

            Ok(batch)
        })();

        match result {
            Ok(batch) => {
                conn.execute_batch("COMMIT")?;
                debug!(
                    user = %user_id,
                    inserted = batch.inserted.len(),
                    skipped = batch.skipped_codes.len(),
                    "Ledger batch committed"
                );
                Ok(batch)
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}
