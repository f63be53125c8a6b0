//! Mock backend for testing
//!
//! Provides deterministic responses for every AI operation, with builder
//! methods to script specific answers and accessors to inspect what the
//! caller sent. Useful for unit tests and development without a running
//! LLM server.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::{LedgerMatchRequest, LedgerProposalRequest, ProposedLedgerAccount};
use super::AIBackend;

/// Requests seen by a mock, shared across clones
#[derive(Debug, Default)]
struct Recorded {
    chart_activities: Vec<String>,
    proposals: Vec<LedgerProposalRequest>,
    matches: Vec<LedgerMatchRequest>,
}

/// Scripted answer for match requests
#[derive(Debug, Clone)]
enum MatchAnswer {
    /// Pick the first candidate whose name appears in the description
    Keyword,
    Fixed(Option<i64>),
}

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Every operation fails when set
    failing: bool,
    chart: Option<Vec<ProposedLedgerAccount>>,
    proposal: Option<ProposedLedgerAccount>,
    match_answer: MatchAnswer,
    recorded: Arc<Mutex<Recorded>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            failing: false,
            chart: None,
            proposal: None,
            match_answer: MatchAnswer::Keyword,
            recorded: Arc::new(Mutex::new(Recorded::default())),
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// A backend whose every call errors, like an unreachable server
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    /// Answer chart generation with exactly these accounts
    pub fn with_chart(mut self, chart: Vec<ProposedLedgerAccount>) -> Self {
        self.chart = Some(chart);
        self
    }

    /// Answer creation-mode requests with this proposal
    pub fn with_proposal(mut self, proposal: ProposedLedgerAccount) -> Self {
        self.proposal = Some(proposal);
        self
    }

    /// Answer match-mode requests with this id (or no match)
    pub fn with_match(mut self, id: Option<i64>) -> Self {
        self.match_answer = MatchAnswer::Fixed(id);
        self
    }

    /// Create a new instance with a different model (no-op for mock)
    pub fn with_model(&self, _model: &str) -> Self {
        self.clone()
    }

    /// Activities passed to `generate_chart_of_accounts`, in call order
    pub fn chart_requests(&self) -> Vec<String> {
        self.recorded
            .lock()
            .map(|r| r.chart_activities.clone())
            .unwrap_or_default()
    }

    /// The most recent creation-mode request
    pub fn last_proposal_request(&self) -> Option<LedgerProposalRequest> {
        self.recorded
            .lock()
            .ok()
            .and_then(|r| r.proposals.last().cloned())
    }

    /// The most recent match-mode request
    pub fn last_match_request(&self) -> Option<LedgerMatchRequest> {
        self.recorded
            .lock()
            .ok()
            .and_then(|r| r.matches.last().cloned())
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing {
            Err(Error::InvalidData("Mock backend configured to fail".into()))
        } else {
            Ok(())
        }
    }

    fn record(&self, f: impl FnOnce(&mut Recorded)) {
        if let Ok(mut recorded) = self.recorded.lock() {
            f(&mut recorded);
        }
    }

    fn default_chart() -> Vec<ProposedLedgerAccount> {
        [
            ("1.1", "Caja", "Efectivo disponible"),
            ("1.2", "Bancos", "Saldos en cuentas bancarias"),
            ("4.1", "Ventas", "Ingresos por la actividad principal"),
            ("5.1", "Alquileres", "Alquiler del local o espacio de trabajo"),
            ("5.2", "Servicios", "Luz, gas, agua e internet"),
        ]
        .into_iter()
        .map(|(code, name, description)| ProposedLedgerAccount {
            code: code.to_string(),
            name: name.to_string(),
            description: Some(description.to_string()),
        })
        .collect()
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate_chart_of_accounts(
        &self,
        activity: &str,
    ) -> Result<Vec<ProposedLedgerAccount>> {
        self.record(|r| r.chart_activities.push(activity.to_string()));
        self.check_failing()?;

        Ok(self.chart.clone().unwrap_or_else(Self::default_chart))
    }

    async fn propose_ledger_account(
        &self,
        request: &LedgerProposalRequest,
    ) -> Result<ProposedLedgerAccount> {
        self.record(|r| r.proposals.push(request.clone()));
        self.check_failing()?;

        if let Some(ref proposal) = self.proposal {
            return Ok(proposal.clone());
        }

        // Next free code in the expenses group
        let next = (1..)
            .map(|n| format!("5.{}", n))
            .find(|code| !request.existing_codes.contains(code))
            .unwrap_or_else(|| "5.999".to_string());

        Ok(ProposedLedgerAccount {
            code: next,
            name: request.purpose.trim().to_string(),
            description: Some(format!("Cuenta para {}", request.purpose.trim())),
        })
    }

    async fn match_ledger_account(&self, request: &LedgerMatchRequest) -> Result<Option<i64>> {
        self.record(|r| r.matches.push(request.clone()));
        self.check_failing()?;

        match self.match_answer {
            MatchAnswer::Fixed(id) => Ok(id),
            MatchAnswer::Keyword => {
                let description = request.description.to_lowercase();
                Ok(request
                    .candidates
                    .iter()
                    .find(|c| description.contains(&c.name.to_lowercase()))
                    .map(|c| c.id))
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::LedgerCandidate;

    #[tokio::test]
    async fn test_default_chart() {
        let mock = MockBackend::new();
        let chart = mock.generate_chart_of_accounts("Kiosco").await.unwrap();
        assert!(!chart.is_empty());
        assert_eq!(mock.chart_requests(), vec!["Kiosco".to_string()]);
    }

    #[tokio::test]
    async fn test_default_proposal_skips_existing_codes() {
        let mock = MockBackend::new();
        let request = LedgerProposalRequest {
            purpose: "Internet".into(),
            entity: String::new(),
            activity: "General".into(),
            existing_codes: vec!["5.1".into(), "5.2".into()],
        };
        let proposal = mock.propose_ledger_account(&request).await.unwrap();
        assert_eq!(proposal.code, "5.3");
        assert_eq!(mock.last_proposal_request(), Some(request));
    }

    #[tokio::test]
    async fn test_keyword_match() {
        let mock = MockBackend::new();
        let request = LedgerMatchRequest {
            description: "Pago de alquiler marzo".into(),
            activity: "General".into(),
            entity: String::new(),
            candidates: vec![
                LedgerCandidate {
                    id: 1,
                    code: "4.1".into(),
                    name: "Ventas".into(),
                },
                LedgerCandidate {
                    id: 2,
                    code: "5.1".into(),
                    name: "Alquiler".into(),
                },
            ],
        };
        assert_eq!(mock.match_ledger_account(&request).await.unwrap(), Some(2));

        let scripted = MockBackend::new().with_match(None);
        assert_eq!(scripted.match_ledger_account(&request).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failing_backend_still_records() {
        let mock = MockBackend::failing();
        assert!(mock.generate_chart_of_accounts("Kiosco").await.is_err());
        assert_eq!(mock.chart_requests().len(), 1);
    }
}
