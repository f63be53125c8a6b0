//! Caja CLI - Mi Caja Chica finance tracker
//!
//! Usage:
//!   caja init                          Initialize database
//!   caja ledger generate "Kiosco"      Generate a chart of accounts with AI
//!   caja transactions add ...          Record a transaction
//!   caja balances                      Show the balance grid
//!   caja serve --port 3000             Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let user = cli.user.as_str();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Serve {
            port,
            host,
            no_auth,
            static_dir,
        } => {
            commands::cmd_serve(
                &cli.db,
                &host,
                port,
                no_auth,
                cli.no_encrypt,
                static_dir.as_deref(),
            )
            .await
        }
        Commands::Balances => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_balances(&db, user)
        }
        Commands::Entities { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_entities_list(&db, user, false),
                Some(EntitiesAction::List { all }) => commands::cmd_entities_list(&db, user, all),
                Some(EntitiesAction::Add { name }) => commands::cmd_entities_add(&db, user, &name),
                Some(EntitiesAction::Rename { id, name }) => {
                    commands::cmd_entities_rename(&db, user, id, &name)
                }
                Some(EntitiesAction::Remove { id }) => {
                    commands::cmd_entities_remove(&db, user, id)
                }
            }
        }
        Commands::Accounts { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_accounts_list(&db, user, false),
                Some(AccountsAction::List { all }) => commands::cmd_accounts_list(&db, user, all),
                Some(AccountsAction::Add { name, bank }) => {
                    commands::cmd_accounts_add(&db, user, &name, &bank)
                }
                Some(AccountsAction::Remove { id }) => {
                    commands::cmd_accounts_remove(&db, user, id)
                }
            }
        }
        Commands::Ledger { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_ledger_list(&db, user, false),
                Some(LedgerAction::List { all }) => commands::cmd_ledger_list(&db, user, all),
                Some(LedgerAction::Add {
                    code,
                    name,
                    description,
                }) => commands::cmd_ledger_add(&db, user, &code, &name, description.as_deref()),
                Some(LedgerAction::Remove { id }) => commands::cmd_ledger_remove(&db, user, id),
                Some(LedgerAction::Generate { activity }) => {
                    let ai = commands::require_ai().await?;
                    commands::cmd_ledger_generate(&db, user, &ai, &activity).await
                }
                Some(LedgerAction::Suggest {
                    purpose,
                    entity,
                    activity,
                }) => {
                    let ai = commands::require_ai().await?;
                    commands::cmd_ledger_suggest(
                        &db,
                        user,
                        &ai,
                        &purpose,
                        entity.as_deref(),
                        activity.as_deref(),
                    )
                    .await
                }
                Some(LedgerAction::Match {
                    description,
                    entity,
                    activity,
                }) => {
                    let ai = commands::require_ai().await?;
                    commands::cmd_ledger_match(
                        &db,
                        user,
                        &ai,
                        &description,
                        entity.as_deref(),
                        activity.as_deref(),
                    )
                    .await
                }
            }
        }
        Commands::Transactions { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let tz = caja_core::datetime::timezone_from_env();
            match action {
                None => commands::cmd_transactions_list(&db, user, 20, None),
                Some(TransactionsAction::List { limit, state }) => {
                    commands::cmd_transactions_list(&db, user, limit, state.as_deref())
                }
                Some(TransactionsAction::Add {
                    description,
                    amount,
                    currency,
                    direction,
                    entity,
                    account,
                    ledger,
                    planned,
                    date,
                }) => commands::cmd_transactions_add(
                    &db,
                    user,
                    tz,
                    commands::TransactionArgs {
                        description: &description,
                        amount,
                        currency: &currency,
                        direction: &direction,
                        entity_id: entity,
                        bank_account_id: account,
                        ledger_account_id: ledger,
                        planned: planned.as_deref(),
                        date: date.as_deref(),
                    },
                ),
                Some(TransactionsAction::Confirm { id, date }) => {
                    commands::cmd_transactions_confirm(&db, user, tz, id, date.as_deref())
                }
                Some(TransactionsAction::Due { days }) => {
                    commands::cmd_transactions_due(&db, user, tz, days)
                }
                Some(TransactionsAction::Delete { id }) => {
                    commands::cmd_transactions_delete(&db, user, id)
                }
            }
        }
        Commands::Report {
            entity,
            account,
            include_planned,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_report(&db, user, entity, account, include_planned)
        }
        Commands::Audit { limit } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_audit(&db, user, limit)
        }
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { prompt_id }) => commands::cmd_prompts_show(&prompt_id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
    }
}
