//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `require_ai` - Shared utility to get the configured AI backend
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use caja_core::ai::{AIBackend, AIClient};
use caja_core::db::Database;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// The AI backend from the environment, or an error explaining how to set one up
pub async fn require_ai() -> Result<AIClient> {
    let client = AIClient::from_env().context(
        "AI backend not configured. Set OLLAMA_HOST (or AI_BACKEND=openai_compatible with OPENAI_COMPATIBLE_HOST)",
    )?;

    if !client.health_check().await {
        tracing::warn!(host = %client.host(), "AI backend configured but not responding");
    }

    Ok(client)
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    // Opening runs the idempotent schema setup
    open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add an entity: caja entities add \"Freelance\"");
    println!("  2. Add a bank account: caja accounts add \"Banco X\" --bank \"Banco X\"");
    println!("  3. Generate a chart of accounts: caja ledger generate \"Freelance\"");
    println!("  4. Start web UI: caja serve");

    Ok(())
}
