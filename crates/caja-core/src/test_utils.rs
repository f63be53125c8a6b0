//! Test utilities for caja-core
//!
//! Provides a mock Ollama server that speaks `/api/tags` and
//! `/api/generate` and answers the ledger prompts deterministically.

use axum::{
    extract::Json,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::serve(
            Router::new()
                .route("/api/tags", get(handle_tags))
                .route("/api/generate", post(handle_generate)),
        )
        .await
    }

    /// Start a server whose generate endpoint always answers 500
    pub async fn start_failing() -> Self {
        Self::serve(
            Router::new()
                .route("/api/tags", get(handle_tags))
                .route(
                    "/api/generate",
                    post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }),
                ),
        )
        .await
    }

    async fn serve(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 4_000_000_000,
        }],
    })
}

/// Ollama generate endpoint
///
/// Dispatches on phrases from prompts/*.md.
async fn handle_generate(Json(request): Json<GenerateRequest>) -> Json<GenerateResponse> {
    let prompt = &request.prompt;

    let response = if prompt.contains("Propose a chart of accounts") {
        chart_mock()
    } else if prompt.contains("Propose ONE new ledger account") {
        proposal_mock(prompt)
    } else if prompt.contains("Available ledger accounts") {
        match_mock(prompt)
    } else {
        "I don't know.".to_string()
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
}

fn chart_mock() -> String {
    // Wrapped in prose like a real model would
    r#"Aquí está el plan de cuentas:
[
  {"code": "1.1", "name": "Caja", "description": "Efectivo"},
  {"code": "1.2", "name": "Bancos", "description": "Cuentas bancarias"},
  {"code": "4.1", "name": "Ventas", "description": "Ingresos por ventas"},
  {"code": "5.1", "name": "Alquiler", "description": "Alquiler del local"},
  {"code": "5.2", "name": "Servicios", "description": "Luz, gas e internet"}
]"#
    .to_string()
}

/// Text between the first pair of double quotes after `marker`
fn quoted_after<'a>(prompt: &'a str, marker: &str) -> Option<&'a str> {
    let rest = &prompt[prompt.find(marker)? + marker.len()..];
    let start = rest.find('"')? + 1;
    let end = rest[start..].find('"')? + start;
    Some(&rest[start..end])
}

fn proposal_mock(prompt: &str) -> String {
    let purpose = quoted_after(prompt, "for this purpose:").unwrap_or("Varios");

    // Codes listed after the "already in use" line
    let used: Vec<&str> = prompt
        .lines()
        .skip_while(|l| !l.contains("Codes already in use"))
        .nth(1)
        .map(|l| l.split(',').map(str::trim).collect())
        .unwrap_or_default();

    let code = (1..)
        .map(|n| format!("5.{}", n))
        .find(|c| !used.contains(&c.as_str()))
        .unwrap();

    serde_json::json!({
        "code": code,
        "name": purpose,
        "description": format!("Gastos de {}", purpose.to_lowercase()),
    })
    .to_string()
}

fn match_mock(prompt: &str) -> String {
    let description = quoted_after(prompt, "Transaction description:")
        .unwrap_or_default()
        .to_lowercase();

    let id = prompt
        .lines()
        .skip_while(|l| !l.contains("Available ledger accounts"))
        .skip(1)
        .take_while(|l| l.contains('|'))
        .filter_map(|line| {
            let mut parts = line.split('|').map(str::trim);
            let id: i64 = parts.next()?.parse().ok()?;
            let _code = parts.next()?;
            let name = parts.next()?.to_lowercase();
            Some((id, name))
        })
        .find(|(_, name)| description.contains(name.as_str()))
        .map(|(id, _)| id);

    serde_json::json!({ "asientoId": id }).to_string()
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_mock_skips_used_codes() {
        let prompt = "Propose ONE new ledger account for this purpose: \"Internet\"\n\
                      Codes already in use (do not reuse any of them):\n5.1, 5.2, 4.1\n";
        let json: serde_json::Value = serde_json::from_str(&proposal_mock(prompt)).unwrap();
        assert_eq!(json["code"], "5.3");
        assert_eq!(json["name"], "Internet");
    }

    #[test]
    fn test_match_mock_by_name() {
        let prompt = "Transaction description: \"Pago de alquiler\"\n\
                      Available ledger accounts (id | code | name):\n\
                      3 | 4.1 | Ventas\n\
                      8 | 5.1 | Alquiler\n\n\
                      Pick the single best account.";
        let json: serde_json::Value = serde_json::from_str(&match_mock(prompt)).unwrap();
        assert_eq!(json["asientoId"], 8);
    }

    #[test]
    fn test_match_mock_no_match_is_null() {
        let prompt = "Transaction description: \"Algo raro\"\n\
                      Available ledger accounts (id | code | name):\n\
                      3 | 4.1 | Ventas\n";
        let json: serde_json::Value = serde_json::from_str(&match_mock(prompt)).unwrap();
        assert!(json["asientoId"].is_null());
    }

    #[tokio::test]
    async fn test_mock_server_health_check() {
        let server = MockOllamaServer::start().await;
        let resp = reqwest::get(format!("{}/api/tags", server.url()))
            .await
            .unwrap();
        assert!(resp.status().is_success());
    }
}
