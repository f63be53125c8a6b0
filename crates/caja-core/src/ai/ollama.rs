//! Ollama backend implementation
//!
//! HTTP client for the Ollama `/api/generate` endpoint, with prompts taken
//! from the prompt library.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::prompts::{PromptLibrary, RenderedPrompt};

use super::parsing::{parse_chart_of_accounts, parse_ledger_match, parse_ledger_proposal};
use super::types::{LedgerMatchRequest, LedgerProposalRequest, ProposedLedgerAccount};
use super::{chart_prompt, match_prompt, proposal_prompt, AIBackend};

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self::with_prompts(base_url, model, PromptLibrary::new())
    }

    /// Create with a specific prompt library (tests use `embedded_only`)
    pub fn with_prompts(base_url: &str, model: &str, prompts: PromptLibrary) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            prompts: Arc::new(RwLock::new(prompts)),
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }

    /// One non-streaming generate round-trip
    async fn generate(&self, prompt: RenderedPrompt) -> Result<String> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.user,
            system: prompt.system,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let ollama_response: OllamaResponse = response.json().await?;
        debug!(model = %self.model, "Ollama response: {}", ollama_response.response);

        Ok(ollama_response.response)
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn generate_chart_of_accounts(
        &self,
        activity: &str,
    ) -> Result<Vec<ProposedLedgerAccount>> {
        let prompt = chart_prompt(&self.prompts, activity)?;
        let response = self.generate(prompt).await?;
        parse_chart_of_accounts(&response)
    }

    async fn propose_ledger_account(
        &self,
        request: &LedgerProposalRequest,
    ) -> Result<ProposedLedgerAccount> {
        let prompt = proposal_prompt(&self.prompts, request)?;
        let response = self.generate(prompt).await?;
        parse_ledger_proposal(&response)
    }

    async fn match_ledger_account(&self, request: &LedgerMatchRequest) -> Result<Option<i64>> {
        let prompt = match_prompt(&self.prompts, request)?;
        let response = self.generate(prompt).await?;
        parse_ledger_match(&response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockOllamaServer;

    fn backend(url: &str) -> OllamaBackend {
        OllamaBackend::with_prompts(url, "llama3.2", PromptLibrary::embedded_only())
    }

    #[test]
    fn test_backend_trims_trailing_slash() {
        let b = backend("http://localhost:11434/");
        assert_eq!(b.host(), "http://localhost:11434");
        assert_eq!(b.with_model("qwen2.5").model(), "qwen2.5");
    }

    #[test]
    fn test_request_serialization_skips_empty_system() {
        let request = OllamaRequest {
            model: "m".into(),
            prompt: "p".into(),
            system: None,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["stream"], false);
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let b = backend("http://127.0.0.1:1");
        assert!(!b.health_check().await);
    }

    #[tokio::test]
    async fn test_generate_chart_against_mock_server() {
        let server = MockOllamaServer::start().await;
        let b = backend(&server.url());

        assert!(b.health_check().await);
        let chart = b.generate_chart_of_accounts("Panadería").await.unwrap();
        assert!(chart.iter().any(|a| a.code == "4.1"));
    }

    #[tokio::test]
    async fn test_match_against_mock_server() {
        let server = MockOllamaServer::start().await;
        let b = backend(&server.url());

        let request = LedgerMatchRequest {
            description: "Pago alquiler".into(),
            activity: "General".into(),
            entity: String::new(),
            candidates: vec![super::super::LedgerCandidate {
                id: 42,
                code: "5.1".into(),
                name: "Alquiler".into(),
            }],
        };
        assert_eq!(b.match_ledger_account(&request).await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_server_error_is_http_error() {
        let server = MockOllamaServer::start_failing().await;
        let b = backend(&server.url());

        let err = b.generate_chart_of_accounts("Kiosco").await.unwrap_err();
        assert!(matches!(err, crate::Error::Http(_)));
    }
}
