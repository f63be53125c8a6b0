//! Error types for Caja

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required field is missing or a value is out of range
    #[error("Validation error: {0}")]
    Validation(String),

    /// The record does not exist or is not owned by the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Match-mode suggestion requested but the user has no active ledger accounts
    #[error("No active ledger accounts")]
    NoAccounts,

    /// The AI provider returned nothing usable for chart generation
    #[error("Generation error: {0}")]
    Generation(String),

    /// The AI provider returned nothing usable for a suggestion
    #[error("Suggestion error: {0}")]
    Suggestion(String),
}

pub type Result<T> = std::result::Result<T, Error>;
