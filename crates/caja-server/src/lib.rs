//! Caja Web Server
//!
//! Axum-based REST API for the Mi Caja Chica finance tracker.
//!
//! Security features:
//! - Session authentication (Cloudflare Access header or API key, --no-auth for local dev)
//! - Every core call is scoped to the session's user id
//! - Restrictive CORS policy
//! - Audit logging for all API access
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono_tz::Tz;
use serde::{de::DeserializeOwned, Serialize};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use caja_core::ai::{AIBackend, AIClient};
use caja_core::datetime::timezone_from_env;
use caja_core::db::Database;

mod extract;
mod handlers;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Maximum accepted JSON body (64 KB)
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Cloudflare Access header for authenticated user email
const CF_ACCESS_USER_HEADER: &str = "cf-access-authenticated-user-email";

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// User id used when authentication is disabled
pub const LOCAL_DEV_USER: &str = "local-dev";

/// An API key and the user it authenticates as
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey {
    pub user: String,
    pub key: String,
}

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only in production)
    pub allowed_origins: Vec<String>,
    /// API keys for service authentication (alternative to Cloudflare Access)
    /// Format: "Bearer <key>" in Authorization header
    pub api_keys: Vec<ApiKey>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
        }
    }
}

/// Parse `CAJA_API_KEYS`: comma-separated `user:key` pairs
///
/// Entries without a user or key are skipped with a warning.
pub fn parse_api_keys(input: &str) -> Vec<ApiKey> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|entry| {
            let parsed = entry
                .split_once(':')
                .map(|(user, key)| (user.trim(), key.trim()))
                .filter(|(user, key)| !user.is_empty() && !key.is_empty());
            if parsed.is_none() {
                warn!("Ignoring malformed CAJA_API_KEYS entry (expected user:key)");
            }
            parsed.map(|(user, key)| ApiKey {
                user: user.to_string(),
                key: key.to_string(),
            })
        })
        .collect()
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    pub ai: Option<AIClient>,
    /// Local timezone for "today" in the due window
    pub timezone: Tz,
}

impl AppState {
    /// The configured AI backend, or a 500 when none is set up
    pub fn ai(&self) -> Result<&AIClient, AppError> {
        self.ai.as_ref().ok_or_else(|| {
            warn!("AI request received but no AI backend is configured");
            AppError::internal("AI backend not configured")
        })
    }
}

/// The authenticated session, inserted by `auth_middleware`
#[derive(Clone, Debug)]
pub struct CurrentUser {
    /// Owner id every core operation is scoped to
    pub id: String,
    /// How the session was established
    pub auth_method: &'static str,
}

/// Authentication middleware
///
/// Resolves the session to a `CurrentUser` extension. The Cloudflare Access
/// header is trusted as-is (the server is expected to sit behind Cloudflare
/// Tunnel, which strips client-supplied CF headers). API keys are compared
/// in constant time.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state.config, request.headers()) {
        Some(user) => {
            tracing::debug!(
                user = %user.id,
                method = user.auth_method,
                path = %request.uri().path(),
                "Authenticated request"
            );
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": "Authentication required"
                })),
            )
                .into_response()
        }
    }
}

/// Resolve request headers to a session user
fn authenticate(config: &ServerConfig, headers: &axum::http::HeaderMap) -> Option<CurrentUser> {
    if !config.require_auth {
        return Some(CurrentUser {
            id: LOCAL_DEV_USER.to_string(),
            auth_method: "none",
        });
    }

    // Cloudflare Access user header
    if let Some(email) = headers
        .get(CF_ACCESS_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return Some(CurrentUser {
            id: email.to_string(),
            auth_method: "cloudflare_header",
        });
    }

    // API key in Authorization header (Bearer token)
    headers
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .and_then(|key| validate_api_key(key.trim(), &config.api_keys))
        .map(|api_key| CurrentUser {
            id: api_key.user.clone(),
            auth_method: "api_key",
        })
}

/// Find the configured key matching `provided` using constant-time comparison
/// to prevent timing attacks.
fn validate_api_key<'a>(provided: &str, valid_keys: &'a [ApiKey]) -> Option<&'a ApiKey> {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    valid_keys.iter().find(|candidate| {
        let key_bytes = candidate.key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
    })
}

/// Read and parse a JSON request body; malformed input is a 400
pub(crate) async fn read_json<T: DeserializeOwned>(request: Request) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(error = %e, "Rejected malformed JSON body");
        AppError::bad_request("Invalid JSON")
    })
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router with the AI backend from the environment
pub fn create_router(db: Database, static_dir: Option<&str>, config: ServerConfig) -> Router {
    let ai = AIClient::from_env();
    if let Some(ref client) = ai {
        info!(
            "AI backend configured: {} (model: {})",
            client.host(),
            client.model()
        );
    } else {
        info!("ℹ️  AI backend not configured (set OLLAMA_HOST to enable AI features)");
    }

    create_router_with_ai(db, static_dir, config, ai, timezone_from_env())
}

/// Create the application router with an explicit AI backend and timezone
pub fn create_router_with_ai(
    db: Database,
    static_dir: Option<&str>,
    config: ServerConfig,
    ai: Option<AIClient>,
    timezone: Tz,
) -> Router {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        ai,
        timezone,
    });

    let api_routes = Router::new()
        // Session
        .route("/me", get(handlers::get_me))
        // Dashboard
        .route("/dashboard/saldos", get(handlers::get_balances))
        .route(
            "/dashboard/transactions",
            get(handlers::recent_transactions),
        )
        // Reports
        .route(
            "/reportes/saldos/detalle",
            get(handlers::report_balance_detail),
        )
        // Entities
        .route(
            "/entidades",
            get(handlers::list_entities).post(handlers::create_entity),
        )
        .route(
            "/entidades/:id",
            patch(handlers::update_entity).delete(handlers::delete_entity),
        )
        // Bank accounts
        .route(
            "/cuentas",
            get(handlers::list_bank_accounts).post(handlers::create_bank_account),
        )
        .route(
            "/cuentas/:id",
            patch(handlers::update_bank_account).delete(handlers::delete_bank_account),
        )
        // Chart of accounts
        .route(
            "/asientos",
            get(handlers::list_ledger_accounts).post(handlers::create_ledger_account),
        )
        .route("/asientos/generate", post(handlers::generate_ledger_accounts))
        .route("/asientos/suggest", post(handlers::suggest_ledger_account))
        .route(
            "/asientos/:id",
            patch(handlers::update_ledger_account).delete(handlers::delete_ledger_account),
        )
        // Transactions
        .route(
            "/transacciones",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route(
            "/transacciones/vencimientos",
            get(handlers::list_due_transactions),
        )
        .route(
            "/transacciones/:id",
            get(handlers::get_transaction).delete(handlers::delete_transaction),
        )
        .route(
            "/transacciones/:id/marcar-realizada",
            patch(handlers::mark_realized),
        )
        // Audit log
        .route("/audit", get(handlers::list_audit_log));

    // Build CORS layer
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods.clone())
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    // CSP: restrict scripts to same-origin, allow inline styles
    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self'; connect-src 'self'; frame-ancestors 'none'"
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve the web UI bundle if a directory was provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
) -> anyhow::Result<()> {
    serve_with_config(db, host, port, static_dir, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    } else if config.api_keys.is_empty() {
        info!("No API keys configured; only Cloudflare Access sessions will be accepted");
    }

    check_ai_connection().await;

    let app = create_router(db, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection() {
    match AIClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  AI backend not configured (set OLLAMA_HOST to enable AI features)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<caja_core::Error> for AppError {
    fn from(err: caja_core::Error) -> Self {
        use caja_core::Error;

        match err {
            Error::Validation(msg) => Self::bad_request(&msg),
            Error::NoAccounts => Self::bad_request(
                "No active ledger accounts; create or generate a chart of accounts first",
            ),
            Error::NotFound(msg) => Self::not_found(&msg),
            Error::Generation(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Failed to generate chart of accounts".to_string(),
                internal: Some(err.into()),
            },
            Error::Suggestion(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Failed to get a suggestion".to_string(),
                internal: Some(err.into()),
            },
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                // Keep full error for logging
                internal: Some(other.into()),
            },
        }
    }
}
