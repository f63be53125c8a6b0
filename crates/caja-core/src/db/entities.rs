//! Entity operations

use rusqlite::{params, OptionalExtension, Row};

use super::{is_unique_violation, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::Entity;

const ENTITY_COLUMNS: &str = "id, user_id, name, active, created_at";

fn entity_from_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    let created_at_str: String = row.get(4)?;
    Ok(Entity {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        active: row.get(3)?,
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Create an entity, or reactivate a soft-deleted one with the same name
    ///
    /// Fails with `Validation` if an active entity already uses the name.
    pub fn create_entity(&self, user_id: &str, name: &str) -> Result<Entity> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Entity name is required".into()));
        }

        let conn = self.conn()?;

        let existing: Option<(i64, bool)> = conn
            .query_row(
                "SELECT id, active FROM entities WHERE user_id = ? AND name = ?",
                params![user_id, name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let id = match existing {
            Some((_, true)) => {
                return Err(Error::Validation(format!(
                    "An entity named '{}' already exists",
                    name
                )))
            }
            Some((id, false)) => {
                conn.execute("UPDATE entities SET active = 1 WHERE id = ?", params![id])?;
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO entities (user_id, name) VALUES (?, ?)",
                    params![user_id, name],
                )?;
                conn.last_insert_rowid()
            }
        };

        self.get_entity(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Entity {}", id)))
    }

    /// Get an entity by ID
    pub fn get_entity(&self, user_id: &str, id: i64) -> Result<Option<Entity>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM entities WHERE id = ? AND user_id = ?",
                ENTITY_COLUMNS
            ),
            params![id, user_id],
            entity_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// List a user's entities, optionally including inactive ones
    pub fn list_entities(&self, user_id: &str, include_inactive: bool) -> Result<Vec<Entity>> {
        let conn = self.conn()?;
        let query = if include_inactive {
            format!(
                "SELECT {} FROM entities WHERE user_id = ? ORDER BY name",
                ENTITY_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM entities WHERE user_id = ? AND active = 1 ORDER BY name",
                ENTITY_COLUMNS
            )
        };

        let mut stmt = conn.prepare(&query)?;
        let entities = stmt
            .query_map(params![user_id], entity_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entities)
    }

    /// Rename an entity
    pub fn rename_entity(&self, user_id: &str, id: i64, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Entity name is required".into()));
        }

        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE entities SET name = ? WHERE id = ? AND user_id = ?",
                params![name, id, user_id],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::Validation(format!("An entity named '{}' already exists", name))
                } else {
                    e.into()
                }
            })?;

        if changed == 0 {
            return Err(Error::NotFound(format!("Entity {}", id)));
        }
        Ok(())
    }

    /// Soft-delete an entity (active = false)
    ///
    /// Its transactions are kept but drop out of the balance grid.
    pub fn deactivate_entity(&self, user_id: &str, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE entities SET active = 0 WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(format!("Entity {}", id)));
        }
        Ok(())
    }
}
