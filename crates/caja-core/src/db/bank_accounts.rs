//! Bank account operations

use rusqlite::{params, OptionalExtension, Row};

use super::{is_unique_violation, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::BankAccount;

const BANK_ACCOUNT_COLUMNS: &str = "id, user_id, name, bank, active, created_at";

fn bank_account_from_row(row: &Row<'_>) -> rusqlite::Result<BankAccount> {
    let created_at_str: String = row.get(5)?;
    Ok(BankAccount {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        bank: row.get(3)?,
        active: row.get(4)?,
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Create a bank account, or reactivate a soft-deleted one with the same name
    pub fn create_bank_account(&self, user_id: &str, name: &str, bank: &str) -> Result<BankAccount> {
        let name = name.trim();
        let bank = bank.trim();
        if name.is_empty() {
            return Err(Error::Validation("Account name is required".into()));
        }
        if bank.is_empty() {
            return Err(Error::Validation("Bank is required".into()));
        }

        let conn = self.conn()?;

        let existing: Option<(i64, bool)> = conn
            .query_row(
                "SELECT id, active FROM bank_accounts WHERE user_id = ? AND name = ?",
                params![user_id, name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let id = match existing {
            Some((_, true)) => {
                return Err(Error::Validation(format!(
                    "An account named '{}' already exists",
                    name
                )))
            }
            Some((id, false)) => {
                conn.execute(
                    "UPDATE bank_accounts SET active = 1, bank = ? WHERE id = ?",
                    params![bank, id],
                )?;
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO bank_accounts (user_id, name, bank) VALUES (?, ?, ?)",
                    params![user_id, name, bank],
                )?;
                conn.last_insert_rowid()
            }
        };

        self.get_bank_account(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Account {}", id)))
    }

    /// Get a bank account by ID
    pub fn get_bank_account(&self, user_id: &str, id: i64) -> Result<Option<BankAccount>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM bank_accounts WHERE id = ? AND user_id = ?",
                BANK_ACCOUNT_COLUMNS
            ),
            params![id, user_id],
            bank_account_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// List a user's bank accounts, optionally including inactive ones
    pub fn list_bank_accounts(
        &self,
        user_id: &str,
        include_inactive: bool,
    ) -> Result<Vec<BankAccount>> {
        let conn = self.conn()?;
        let query = if include_inactive {
            format!(
                "SELECT {} FROM bank_accounts WHERE user_id = ? ORDER BY name",
                BANK_ACCOUNT_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM bank_accounts WHERE user_id = ? AND active = 1 ORDER BY name",
                BANK_ACCOUNT_COLUMNS
            )
        };

        let mut stmt = conn.prepare(&query)?;
        let accounts = stmt
            .query_map(params![user_id], bank_account_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Update a bank account's name and bank label
    pub fn update_bank_account(&self, user_id: &str, id: i64, name: &str, bank: &str) -> Result<()> {
        let name = name.trim();
        let bank = bank.trim();
        if name.is_empty() || bank.is_empty() {
            return Err(Error::Validation("Account name and bank are required".into()));
        }

        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE bank_accounts SET name = ?, bank = ? WHERE id = ? AND user_id = ?",
                params![name, bank, id, user_id],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::Validation(format!("An account named '{}' already exists", name))
                } else {
                    e.into()
                }
            })?;

        if changed == 0 {
            return Err(Error::NotFound(format!("Account {}", id)));
        }
        Ok(())
    }

    /// Soft-delete a bank account (active = false)
    pub fn deactivate_bank_account(&self, user_id: &str, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE bank_accounts SET active = 0 WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("Account {}", id)));
        }
        Ok(())
    }
}
