//! Entity and bank account command implementations

use anyhow::Result;
use caja_core::db::Database;

use super::truncate;

/// List entities
pub fn cmd_entities_list(db: &Database, user: &str, show_inactive: bool) -> Result<()> {
    let entities = db.list_entities(user, show_inactive)?;

    if entities.is_empty() {
        println!("No entities found. Add one with:");
        println!("  caja entities add <name>");
        return Ok(());
    }

    println!();
    println!("🏢 Entities");
    println!("   ──────────────────────────────────────────");
    println!("   {:>4} │ {:24} │ {}", "ID", "Name", "Status");
    println!("   ─────┼──────────────────────────┼─────────");

    for entity in entities {
        let status = if entity.active { "active" } else { "inactive" };
        println!(
            "   {:>4} │ {:24} │ {}",
            entity.id,
            truncate(&entity.name, 24),
            status
        );
    }

    Ok(())
}

/// Add an entity, reactivating a deactivated one with the same name
pub fn cmd_entities_add(db: &Database, user: &str, name: &str) -> Result<()> {
    let entity = db.create_entity(user, name)?;
    db.log_audit(user, "create", Some("entity"), Some(entity.id), Some("cli"))?;

    println!("✅ Entity '{}' ready (id: {})", entity.name, entity.id);
    Ok(())
}

/// Rename an entity
pub fn cmd_entities_rename(db: &Database, user: &str, id: i64, name: &str) -> Result<()> {
    db.rename_entity(user, id, name)?;
    db.log_audit(user, "update", Some("entity"), Some(id), Some("cli"))?;

    println!("✅ Entity {} renamed to '{}'", id, name.trim());
    Ok(())
}

/// Deactivate an entity; its transactions are kept but leave the balance grid
pub fn cmd_entities_remove(db: &Database, user: &str, id: i64) -> Result<()> {
    db.deactivate_entity(user, id)?;
    db.log_audit(user, "deactivate", Some("entity"), Some(id), Some("cli"))?;

    println!("✅ Entity {} deactivated", id);
    Ok(())
}

/// List bank accounts
pub fn cmd_accounts_list(db: &Database, user: &str, show_inactive: bool) -> Result<()> {
    let accounts = db.list_bank_accounts(user, show_inactive)?;

    if accounts.is_empty() {
        println!("No bank accounts found. Add one with:");
        println!("  caja accounts add <name> --bank <bank>");
        return Ok(());
    }

    println!();
    println!("🏦 Bank accounts");
    println!("   ─────────────────────────────────────────────────────────");
    println!("   {:>4} │ {:24} │ {:16} │ {}", "ID", "Name", "Bank", "Status");
    println!("   ─────┼──────────────────────────┼──────────────────┼─────────");

    for account in accounts {
        let status = if account.active { "active" } else { "inactive" };
        println!(
            "   {:>4} │ {:24} │ {:16} │ {}",
            account.id,
            truncate(&account.name, 24),
            truncate(&account.bank, 16),
            status
        );
    }

    Ok(())
}

/// Add a bank account
pub fn cmd_accounts_add(db: &Database, user: &str, name: &str, bank: &str) -> Result<()> {
    let account = db.create_bank_account(user, name, bank)?;
    db.log_audit(
        user,
        "create",
        Some("bank_account"),
        Some(account.id),
        Some("cli"),
    )?;

    println!(
        "✅ Account '{}' ({}) ready (id: {})",
        account.name, account.bank, account.id
    );
    Ok(())
}

/// Deactivate a bank account
pub fn cmd_accounts_remove(db: &Database, user: &str, id: i64) -> Result<()> {
    db.deactivate_bank_account(user, id)?;
    db.log_audit(user, "deactivate", Some("bank_account"), Some(id), Some("cli"))?;

    println!("✅ Account {} deactivated", id);
    Ok(())
}
