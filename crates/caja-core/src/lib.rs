//! Caja Core Library
//!
//! Shared functionality for the Mi Caja Chica finance tracker:
//! - Database access (entities, bank accounts, chart of accounts, transactions)
//! - Balance aggregation per entity, bank account and currency
//! - Ledger reconciliation of AI-proposed accounts and categorizations
//! - Pluggable AI backends (Ollama, OpenAI-compatible, mock)
//! - Prompt library for customizable AI prompts

pub mod ai;
pub mod balances;
pub mod datetime;
pub mod db;
pub mod error;
pub mod models;
pub mod prompts;
pub mod reconcile;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIBackend, AIClient, LedgerCandidate, LedgerMatchRequest, LedgerProposalRequest, MockBackend,
    OllamaBackend, OpenAICompatibleBackend, ProposedLedgerAccount,
};
pub use balances::{compute_balances, BalanceGrid, BalanceSheet, CurrencyBalance};
pub use db::{AuditEntry, Database, LedgerBatchResult, TransactionReportFilter};
pub use error::{Error, Result};
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use reconcile::{GenerationOutcome, LedgerReconciler, Suggestion, SuggestionRequest};
