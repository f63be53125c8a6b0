//! Pluggable AI backend abstraction
//!
//! This module provides a backend-agnostic interface for the AI operations
//! behind ledger reconciliation.
//!
//! # Architecture
//!
//! - `AIBackend` trait: defines the interface for all AI operations
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, openai_compatible, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Default model name (default: llama3.2)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::prompts::{PromptId, PromptLibrary, RenderedPrompt};

/// Trait defining the interface for all AI backends
///
/// Each call is a single round-trip: no streaming, no retry. Any failure
/// (transport, empty answer, malformed JSON) comes back as `Err`.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Propose a full chart of accounts for a business activity
    async fn generate_chart_of_accounts(&self, activity: &str)
        -> Result<Vec<ProposedLedgerAccount>>;

    /// Propose one new ledger account that does not reuse an existing code
    async fn propose_ledger_account(
        &self,
        request: &LedgerProposalRequest,
    ) -> Result<ProposedLedgerAccount>;

    /// Pick the best candidate for a transaction; `None` when nothing fits
    async fn match_ledger_account(&self, request: &LedgerMatchRequest) -> Result<Option<i64>>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    Ollama(OllamaBackend),
    /// Docker Model Runner, vLLM, LocalAI, llama-server, etc.
    OpenAICompatible(OpenAICompatibleBackend),
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Returns None if the selected backend's required variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(AIClient::Ollama)
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::Ollama(b) => AIClient::Ollama(b.with_model(model)),
            AIClient::OpenAICompatible(b) => AIClient::OpenAICompatible(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.with_model(model)),
        }
    }
}

impl From<MockBackend> for AIClient {
    fn from(mock: MockBackend) -> Self {
        AIClient::Mock(mock)
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn generate_chart_of_accounts(
        &self,
        activity: &str,
    ) -> Result<Vec<ProposedLedgerAccount>> {
        match self {
            AIClient::Ollama(b) => b.generate_chart_of_accounts(activity).await,
            AIClient::OpenAICompatible(b) => b.generate_chart_of_accounts(activity).await,
            AIClient::Mock(b) => b.generate_chart_of_accounts(activity).await,
        }
    }

    async fn propose_ledger_account(
        &self,
        request: &LedgerProposalRequest,
    ) -> Result<ProposedLedgerAccount> {
        match self {
            AIClient::Ollama(b) => b.propose_ledger_account(request).await,
            AIClient::OpenAICompatible(b) => b.propose_ledger_account(request).await,
            AIClient::Mock(b) => b.propose_ledger_account(request).await,
        }
    }

    async fn match_ledger_account(&self, request: &LedgerMatchRequest) -> Result<Option<i64>> {
        match self {
            AIClient::Ollama(b) => b.match_ledger_account(request).await,
            AIClient::OpenAICompatible(b) => b.match_ledger_account(request).await,
            AIClient::Mock(b) => b.match_ledger_account(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

fn render(
    prompts: &RwLock<PromptLibrary>,
    id: PromptId,
    vars: &HashMap<&str, &str>,
) -> Result<RenderedPrompt> {
    let mut prompts = prompts
        .write()
        .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
    prompts.render(id, vars)
}

pub(crate) fn chart_prompt(prompts: &RwLock<PromptLibrary>, activity: &str) -> Result<RenderedPrompt> {
    let mut vars = HashMap::new();
    vars.insert("activity", activity);
    render(prompts, PromptId::GenerateChartOfAccounts, &vars)
}

pub(crate) fn proposal_prompt(
    prompts: &RwLock<PromptLibrary>,
    request: &LedgerProposalRequest,
) -> Result<RenderedPrompt> {
    let existing_codes = request.existing_codes.join(", ");

    let mut vars = HashMap::new();
    vars.insert("purpose", request.purpose.as_str());
    vars.insert("activity", request.activity.as_str());
    vars.insert("entity", request.entity.as_str());
    vars.insert("existing_codes", existing_codes.as_str());
    render(prompts, PromptId::ProposeLedgerAccount, &vars)
}

pub(crate) fn match_prompt(
    prompts: &RwLock<PromptLibrary>,
    request: &LedgerMatchRequest,
) -> Result<RenderedPrompt> {
    let candidates = request
        .candidates
        .iter()
        .map(|c| format!("{} | {} | {}", c.id, c.code, c.name))
        .collect::<Vec<_>>()
        .join("\n");

    let mut vars = HashMap::new();
    vars.insert("description", request.description.as_str());
    vars.insert("activity", request.activity.as_str());
    vars.insert("entity", request.entity.as_str());
    vars.insert("candidates", candidates.as_str());
    render(prompts, PromptId::MatchLedgerAccount, &vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        assert!(AIClient::mock().health_check().await);
        assert!(!AIClient::from(MockBackend::unhealthy()).health_check().await);
    }

    #[test]
    fn test_match_prompt_lists_candidates() {
        let prompts = RwLock::new(PromptLibrary::embedded_only());
        let request = LedgerMatchRequest {
            description: "Pago de luz".into(),
            activity: "Kiosco".into(),
            entity: String::new(),
            candidates: vec![LedgerCandidate {
                id: 7,
                code: "5.2".into(),
                name: "Servicios".into(),
            }],
        };

        let prompt = match_prompt(&prompts, &request).unwrap();
        assert!(prompt.user.contains("7 | 5.2 | Servicios"));
        assert!(prompt.user.contains("Pago de luz"));
        // Empty entity drops its conditional block
        assert!(!prompt.user.contains("Entity:"));
    }

    #[test]
    fn test_proposal_prompt_lists_existing_codes() {
        let prompts = RwLock::new(PromptLibrary::embedded_only());
        let request = LedgerProposalRequest {
            purpose: "Internet".into(),
            entity: "Kiosco".into(),
            activity: "General".into(),
            existing_codes: vec!["5.1".into(), "5.2".into()],
        };

        let prompt = proposal_prompt(&prompts, &request).unwrap();
        assert!(prompt.user.contains("5.1, 5.2"));
        assert!(prompt.user.contains("Entity: Kiosco"));
    }
}
