//! AI backend request and response types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde::{Deserialize, Serialize};

use crate::models::{LedgerAccount, NewLedgerAccount};

/// A ledger account as proposed by the model, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedLedgerAccount {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ProposedLedgerAccount {
    /// Trimmed copy, or None when code or name is blank
    pub fn normalized(&self) -> Option<NewLedgerAccount> {
        let code = self.code.trim();
        let name = self.name.trim();
        if code.is_empty() || name.is_empty() {
            return None;
        }
        Some(NewLedgerAccount {
            code: code.to_string(),
            name: name.to_string(),
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from),
        })
    }
}

/// Context for proposing one new ledger account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerProposalRequest {
    pub purpose: String,
    /// Entity name, empty when not given
    pub entity: String,
    /// Business activity, "General" when not given
    pub activity: String,
    /// Every code the user already holds
    pub existing_codes: Vec<String>,
}

/// A ledger account offered to the model as a match candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerCandidate {
    pub id: i64,
    pub code: String,
    pub name: String,
}

impl From<&LedgerAccount> for LedgerCandidate {
    fn from(account: &LedgerAccount) -> Self {
        Self {
            id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
        }
    }
}

/// Context for matching a transaction to an existing ledger account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerMatchRequest {
    pub description: String,
    pub activity: String,
    pub entity: String,
    pub candidates: Vec<LedgerCandidate>,
}

/// Model answer for a match request
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LedgerMatchResponse {
    #[serde(rename = "asientoId", alias = "asiento_id", alias = "id", default)]
    pub asiento_id: Option<i64>,
}
