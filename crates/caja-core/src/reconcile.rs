//! Ledger reconciliation engine
//!
//! Merges AI-proposed ledger accounts into a user's chart of accounts and
//! validates AI categorizations against it. The store is only ever added
//! to: an existing code is never overwritten or removed.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::ai::{
    AIBackend, LedgerCandidate, LedgerMatchRequest, LedgerProposalRequest, ProposedLedgerAccount,
};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{LedgerAccount, NewLedgerAccount};

/// Activity used when the caller does not name one
pub const DEFAULT_ACTIVITY: &str = "General";

/// Result of a chart-of-accounts generation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationOutcome {
    /// Accounts written by this run
    pub inserted: Vec<LedgerAccount>,
    /// Proposed codes the user already held
    pub skipped_codes: Vec<String>,
    /// Proposals dropped for a blank code or name, or a repeated code
    pub discarded: usize,
}

impl GenerationOutcome {
    pub fn count(&self) -> usize {
        self.inserted.len()
    }
}

/// What the caller wants suggested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionRequest {
    /// Propose a brand-new account for a stated purpose
    Creation {
        purpose: String,
        entity: Option<String>,
        activity: Option<String>,
    },
    /// Pick one of the user's active accounts for a transaction
    Match {
        description: String,
        entity: Option<String>,
        activity: Option<String>,
    },
}

/// Answer to a `SuggestionRequest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Suggestion {
    /// Not persisted; the caller decides whether to create it
    NewAccount(NewLedgerAccount),
    Existing {
        #[serde(rename = "asientoId")]
        asiento_id: i64,
    },
}

/// Drop blank proposals and repeated codes; the first occurrence of a code wins
pub fn normalize_proposals(proposals: &[ProposedLedgerAccount]) -> (Vec<NewLedgerAccount>, usize) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(proposals.len());

    for proposal in proposals {
        if let Some(account) = proposal.normalized() {
            if seen.insert(account.code.clone()) {
                kept.push(account);
            }
        }
    }

    let discarded = proposals.len() - kept.len();
    (kept, discarded)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Reconciles AI output against one database
pub struct LedgerReconciler<'a> {
    db: &'a Database,
    ai: &'a dyn AIBackend,
}

impl<'a> LedgerReconciler<'a> {
    pub fn new(db: &'a Database, ai: &'a dyn AIBackend) -> Self {
        Self { db, ai }
    }

    /// Generate a chart of accounts for `activity` and insert the new codes
    ///
    /// Re-running for an already populated user inserts nothing.
    pub async fn generate_chart_of_accounts(
        &self,
        user_id: &str,
        activity: &str,
    ) -> Result<GenerationOutcome> {
        let activity = activity.trim();
        if activity.is_empty() {
            return Err(Error::Validation("Activity type is required".into()));
        }

        let proposals = self
            .ai
            .generate_chart_of_accounts(activity)
            .await
            .map_err(|e| {
                warn!(user = %user_id, model = %self.ai.model(), "Chart generation failed: {}", e);
                Error::Generation(e.to_string())
            })?;

        let (accounts, discarded) = normalize_proposals(&proposals);
        if accounts.is_empty() {
            return Err(Error::Generation(
                "AI returned no usable ledger accounts".into(),
            ));
        }

        let batch = self.db.insert_ledger_accounts_batch(user_id, &accounts)?;

        info!(
            user = %user_id,
            activity = %activity,
            inserted = batch.inserted.len(),
            skipped = batch.skipped_codes.len(),
            discarded,
            "Chart of accounts generated"
        );

        Ok(GenerationOutcome {
            inserted: batch.inserted,
            skipped_codes: batch.skipped_codes,
            discarded,
        })
    }

    /// Suggest a ledger account in creation or match mode
    pub async fn suggest(&self, user_id: &str, request: &SuggestionRequest) -> Result<Suggestion> {
        match request {
            SuggestionRequest::Creation {
                purpose,
                entity,
                activity,
            } => self
                .propose_new_account(user_id, purpose, entity.as_deref(), activity.as_deref())
                .await
                .map(Suggestion::NewAccount),
            SuggestionRequest::Match {
                description,
                entity,
                activity,
            } => self
                .match_existing_account(user_id, description, entity.as_deref(), activity.as_deref())
                .await
                .map(|asiento_id| Suggestion::Existing { asiento_id }),
        }
    }

    /// Creation mode: ask for one new account given every code in use
    pub async fn propose_new_account(
        &self,
        user_id: &str,
        purpose: &str,
        entity: Option<&str>,
        activity: Option<&str>,
    ) -> Result<NewLedgerAccount> {
        let purpose = purpose.trim();
        if purpose.is_empty() {
            return Err(Error::Validation("Purpose is required".into()));
        }

        let request = LedgerProposalRequest {
            purpose: purpose.to_string(),
            entity: non_blank(entity).unwrap_or_default().to_string(),
            activity: non_blank(activity).unwrap_or(DEFAULT_ACTIVITY).to_string(),
            existing_codes: self.db.list_ledger_codes(user_id)?,
        };

        let proposal = self
            .ai
            .propose_ledger_account(&request)
            .await
            .map_err(|e| {
                warn!(user = %user_id, "Ledger proposal failed: {}", e);
                Error::Suggestion(e.to_string())
            })?;

        let account = proposal
            .normalized()
            .ok_or_else(|| Error::Suggestion("AI returned an empty proposal".into()))?;

        if request.existing_codes.contains(&account.code) {
            warn!(user = %user_id, code = %account.code, "AI proposed a code already in use");
        }

        Ok(account)
    }

    /// Match mode: pick one of the user's active accounts
    ///
    /// The returned id must be one of the candidates that were offered.
    pub async fn match_existing_account(
        &self,
        user_id: &str,
        description: &str,
        entity: Option<&str>,
        activity: Option<&str>,
    ) -> Result<i64> {
        let description = description.trim();
        if description.is_empty() {
            return Err(Error::Validation("Transaction description is required".into()));
        }

        let accounts = self.db.list_ledger_accounts(user_id, false)?;
        if accounts.is_empty() {
            return Err(Error::NoAccounts);
        }

        let request = LedgerMatchRequest {
            description: description.to_string(),
            activity: non_blank(activity).unwrap_or(DEFAULT_ACTIVITY).to_string(),
            entity: non_blank(entity).unwrap_or_default().to_string(),
            candidates: accounts.iter().map(LedgerCandidate::from).collect(),
        };

        let answer = self.ai.match_ledger_account(&request).await.map_err(|e| {
            warn!(user = %user_id, "Ledger match failed: {}", e);
            Error::Suggestion(e.to_string())
        })?;

        let id = answer.ok_or_else(|| Error::Suggestion("AI found no matching account".into()))?;

        if !request.candidates.iter().any(|c| c.id == id) {
            warn!(user = %user_id, asiento_id = id, "AI returned an id outside the candidate set");
            return Err(Error::Suggestion(format!(
                "AI returned unknown ledger account {}",
                id
            )));
        }

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;

    const USER: &str = "ana@example.com";

    fn proposed(code: &str, name: &str) -> ProposedLedgerAccount {
        ProposedLedgerAccount {
            code: code.into(),
            name: name.into(),
            description: None,
        }
    }

    fn seed_ledger(db: &Database, code: &str, name: &str) -> LedgerAccount {
        db.create_ledger_account(
            USER,
            &NewLedgerAccount {
                code: code.into(),
                name: name.into(),
                description: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_proposals() {
        let (kept, discarded) = normalize_proposals(&[
            proposed("4.1", "Ventas"),
            proposed(" ", "Sin código"),
            proposed("5.1", ""),
            proposed("4.1", "Ventas duplicadas"),
            proposed(" 5.2 ", " Luz "),
        ]);
        assert_eq!(discarded, 3);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].name, "Ventas");
        assert_eq!(kept[1].code, "5.2");
        assert_eq!(kept[1].name, "Luz");
    }

    #[tokio::test]
    async fn test_generate_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let ai = MockBackend::new();
        let reconciler = LedgerReconciler::new(&db, &ai);

        let first = reconciler
            .generate_chart_of_accounts(USER, "Kiosco")
            .await
            .unwrap();
        assert!(first.count() > 0);

        let second = reconciler
            .generate_chart_of_accounts(USER, "Kiosco")
            .await
            .unwrap();
        assert_eq!(second.count(), 0);
        assert_eq!(second.skipped_codes.len(), first.count());
        assert_eq!(db.list_ledger_codes(USER).unwrap().len(), first.count());
    }

    #[tokio::test]
    async fn test_generate_skips_colliding_codes() {
        let db = Database::in_memory().unwrap();
        let existing = seed_ledger(&db, "4.1", "Honorarios");

        let ai = MockBackend::new().with_chart(vec![
            proposed("4.1", "Ventas"),
            proposed("5.1", "Alquiler"),
            proposed("5.2", "Servicios"),
        ]);
        let outcome = LedgerReconciler::new(&db, &ai)
            .generate_chart_of_accounts(USER, "Comercio")
            .await
            .unwrap();

        assert_eq!(outcome.count(), 2);
        let codes: Vec<&str> = outcome.inserted.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes, vec!["5.1", "5.2"]);
        assert_eq!(outcome.skipped_codes, vec!["4.1".to_string()]);

        let untouched = db.get_ledger_account(USER, existing.id).unwrap().unwrap();
        assert_eq!(untouched.name, "Honorarios");
    }

    #[tokio::test]
    async fn test_generate_requires_activity() {
        let db = Database::in_memory().unwrap();
        let ai = MockBackend::new();
        let result = LedgerReconciler::new(&db, &ai)
            .generate_chart_of_accounts(USER, "   ")
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(ai.chart_requests().is_empty());
    }

    #[tokio::test]
    async fn test_generate_provider_failure() {
        let db = Database::in_memory().unwrap();

        let failing = MockBackend::failing();
        let result = LedgerReconciler::new(&db, &failing)
            .generate_chart_of_accounts(USER, "Kiosco")
            .await;
        assert!(matches!(result, Err(Error::Generation(_))));

        let empty = MockBackend::new().with_chart(vec![]);
        let result = LedgerReconciler::new(&db, &empty)
            .generate_chart_of_accounts(USER, "Kiosco")
            .await;
        assert!(matches!(result, Err(Error::Generation(_))));

        assert!(db.list_ledger_codes(USER).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_creation_mode_passes_existing_codes() {
        let db = Database::in_memory().unwrap();
        seed_ledger(&db, "5.1", "Alquiler");
        seed_ledger(&db, "4.1", "Ventas");

        let ai = MockBackend::new();
        let suggestion = LedgerReconciler::new(&db, &ai)
            .suggest(
                USER,
                &SuggestionRequest::Creation {
                    purpose: "Internet".into(),
                    entity: Some("Kiosco".into()),
                    activity: None,
                },
            )
            .await
            .unwrap();

        let Suggestion::NewAccount(account) = suggestion else {
            panic!("expected a new account proposal");
        };
        assert_eq!(account.code, "5.2");

        let sent = ai.last_proposal_request().unwrap();
        assert_eq!(sent.existing_codes, vec!["4.1".to_string(), "5.1".to_string()]);
        assert_eq!(sent.activity, DEFAULT_ACTIVITY);
        assert_eq!(sent.entity, "Kiosco");

        // Nothing was persisted
        assert_eq!(db.list_ledger_codes(USER).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_creation_mode_validation() {
        let db = Database::in_memory().unwrap();
        let ai = MockBackend::new();
        let reconciler = LedgerReconciler::new(&db, &ai);

        let result = reconciler.propose_new_account(USER, "", None, None).await;
        assert!(matches!(result, Err(Error::Validation(_))));

        let blank = MockBackend::new().with_proposal(proposed("", ""));
        let result = LedgerReconciler::new(&db, &blank)
            .propose_new_account(USER, "Internet", None, None)
            .await;
        assert!(matches!(result, Err(Error::Suggestion(_))));
    }

    #[tokio::test]
    async fn test_match_mode() {
        let db = Database::in_memory().unwrap();
        seed_ledger(&db, "4.1", "Ventas");
        let rent = seed_ledger(&db, "5.1", "Alquiler");

        let ai = MockBackend::new();
        let id = LedgerReconciler::new(&db, &ai)
            .match_existing_account(USER, "Alquiler de marzo", None, Some("Kiosco"))
            .await
            .unwrap();
        assert_eq!(id, rent.id);

        let sent = ai.last_match_request().unwrap();
        assert_eq!(sent.candidates.len(), 2);
        assert_eq!(sent.activity, "Kiosco");
    }

    #[tokio::test]
    async fn test_match_mode_rejects_unknown_id() {
        let db = Database::in_memory().unwrap();
        seed_ledger(&db, "4.1", "Ventas");

        let ai = MockBackend::new().with_match(Some(9999));
        let result = LedgerReconciler::new(&db, &ai)
            .match_existing_account(USER, "Venta mostrador", None, None)
            .await;
        assert!(matches!(result, Err(Error::Suggestion(_))));
    }

    #[tokio::test]
    async fn test_match_mode_excludes_inactive_accounts() {
        let db = Database::in_memory().unwrap();
        let old = seed_ledger(&db, "5.1", "Alquiler");
        db.deactivate_ledger_account(USER, old.id).unwrap();

        let ai = MockBackend::new().with_match(Some(old.id));
        let result = LedgerReconciler::new(&db, &ai)
            .match_existing_account(USER, "Alquiler", None, None)
            .await;
        assert!(matches!(result, Err(Error::NoAccounts)));
    }

    #[tokio::test]
    async fn test_match_mode_no_answer() {
        let db = Database::in_memory().unwrap();
        seed_ledger(&db, "4.1", "Ventas");

        let ai = MockBackend::new().with_match(None);
        let result = LedgerReconciler::new(&db, &ai)
            .match_existing_account(USER, "Algo", None, None)
            .await;
        assert!(matches!(result, Err(Error::Suggestion(_))));

        let result = LedgerReconciler::new(&db, &ai)
            .match_existing_account(USER, " ", None, None)
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_suggestion_json_shape() {
        let existing = serde_json::to_value(Suggestion::Existing { asiento_id: 5 }).unwrap();
        assert_eq!(existing, serde_json::json!({"asientoId": 5}));

        let new = serde_json::to_value(Suggestion::NewAccount(NewLedgerAccount {
            code: "5.3".into(),
            name: "Internet".into(),
            description: None,
        }))
        .unwrap();
        assert_eq!(new["code"], "5.3");
    }
}
