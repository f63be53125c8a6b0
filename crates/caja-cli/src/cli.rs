//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

/// Caja - Mi Caja Chica finance tracker
#[derive(Parser)]
#[command(name = "caja")]
#[command(about = "Self-hosted petty cash and small-business ledger", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "caja.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set CAJA_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// User whose records the command reads and writes
    ///
    /// Matches the id the web server assigns (the Cloudflare Access email,
    /// the API key's user, or "local-dev" with --no-auth).
    #[arg(long, default_value = "local-dev", global = true)]
    pub user: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, the server requires Cloudflare Access headers or an API key.
        #[arg(long)]
        no_auth: bool,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Show the balance grid (entity x bank account x currency)
    Balances,

    /// Manage entities
    Entities {
        #[command(subcommand)]
        action: Option<EntitiesAction>,
    },

    /// Manage bank accounts
    Accounts {
        #[command(subcommand)]
        action: Option<AccountsAction>,
    },

    /// Manage the chart of accounts
    Ledger {
        #[command(subcommand)]
        action: Option<LedgerAction>,
    },

    /// Manage transactions
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// List the transactions behind one balance cell
    Report {
        /// Entity ID
        #[arg(long)]
        entity: i64,

        /// Bank account ID
        #[arg(long)]
        account: i64,

        /// Include planned (not yet realized) transactions
        #[arg(long)]
        include_planned: bool,
    },

    /// Show the audit log
    Audit {
        /// Maximum entries to show
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },

    /// Manage AI prompts
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },
}

#[derive(Subcommand)]
pub enum EntitiesAction {
    /// List entities
    List {
        /// Include deactivated entities
        #[arg(long)]
        all: bool,
    },
    /// Add an entity (reactivates a deactivated one with the same name)
    Add {
        /// Entity name
        name: String,
    },
    /// Rename an entity
    Rename {
        /// Entity ID
        id: i64,
        /// New name
        name: String,
    },
    /// Deactivate an entity
    Remove {
        /// Entity ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum AccountsAction {
    /// List bank accounts
    List {
        /// Include deactivated accounts
        #[arg(long)]
        all: bool,
    },
    /// Add a bank account
    Add {
        /// Account name (unique)
        name: String,
        /// Bank label
        #[arg(short, long)]
        bank: String,
    },
    /// Deactivate a bank account
    Remove {
        /// Account ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum LedgerAction {
    /// List ledger accounts
    List {
        /// Include deactivated accounts
        #[arg(long)]
        all: bool,
    },
    /// Add a ledger account by hand
    Add {
        /// Account code (unique, e.g. "5.3")
        code: String,
        /// Account name
        name: String,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Deactivate a ledger account
    Remove {
        /// Ledger account ID
        id: i64,
    },
    /// Generate a chart of accounts with AI (existing codes are kept)
    Generate {
        /// Business activity, e.g. "Kiosco" or "Freelance"
        activity: String,
    },
    /// Ask the AI to propose one new ledger account (nothing is saved)
    Suggest {
        /// What the account is for
        purpose: String,
        /// Entity name for context
        #[arg(long)]
        entity: Option<String>,
        /// Business activity for context
        #[arg(long)]
        activity: Option<String>,
    },
    /// Ask the AI which existing ledger account fits a transaction
    Match {
        /// Transaction description
        description: String,
        /// Entity name for context
        #[arg(long)]
        entity: Option<String>,
        /// Business activity for context
        #[arg(long)]
        activity: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List recent transactions
    List {
        /// Maximum transactions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
        /// Only PLANIFICADA or REAL
        #[arg(long)]
        state: Option<String>,
    },
    /// Record a transaction
    Add {
        /// Description
        #[arg(long)]
        description: String,
        /// Amount (positive; the sign comes from --direction)
        #[arg(long)]
        amount: Decimal,
        /// ARS or USD
        #[arg(long, default_value = "ARS")]
        currency: String,
        /// INGRESO or EGRESO
        #[arg(long)]
        direction: String,
        /// Entity ID
        #[arg(long)]
        entity: i64,
        /// Bank account ID
        #[arg(long)]
        account: i64,
        /// Ledger account ID
        #[arg(long)]
        ledger: i64,
        /// Schedule for this date (YYYY-MM-DD) instead of recording it as realized
        #[arg(long, conflicts_with = "date")]
        planned: Option<String>,
        /// Realization date (YYYY-MM-DD, default: now)
        #[arg(long)]
        date: Option<String>,
    },
    /// Mark a planned transaction as realized
    Confirm {
        /// Transaction ID
        id: i64,
        /// Realization date (YYYY-MM-DD, default: now)
        #[arg(long)]
        date: Option<String>,
    },
    /// List planned transactions due soon (including overdue ones)
    Due {
        /// Look-ahead window in days
        #[arg(short, long, default_value = "7")]
        days: u32,
    },
    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all prompts and their override status
    List,
    /// Show the content of a prompt
    Show {
        /// Prompt ID (e.g., generate_chart_of_accounts)
        prompt_id: String,
    },
    /// Show the override directory path
    Path,
}
