//! Chart of accounts ("asientos") handlers, including AI generation and suggestion

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::entities::ListQuery;
use crate::extract::{ApiPath, ApiQuery};
use crate::{read_json, AppError, AppState, CurrentUser, SuccessResponse};
use caja_core::models::{LedgerAccount, NewLedgerAccount};
use caja_core::{LedgerReconciler, Suggestion, SuggestionRequest};

/// GET /api/asientos - List ledger accounts ordered by code
pub async fn list_ledger_accounts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(params): ApiQuery<ListQuery>,
) -> Result<Json<Vec<LedgerAccount>>, AppError> {
    let accounts = state
        .db
        .list_ledger_accounts(&user.id, params.include_inactive)?;

    state.db.log_audit(
        &user.id,
        "list",
        Some("ledger_account"),
        None,
        Some(&format!("count={}", accounts.len())),
    )?;

    Ok(Json(accounts))
}

/// Request body for creating a ledger account by hand
#[derive(Debug, Deserialize)]
pub struct CreateLedgerAccountRequest {
    #[serde(alias = "codigo")]
    pub code: String,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "descripcion")]
    pub description: Option<String>,
}

/// POST /api/asientos - Create a ledger account
pub async fn create_ledger_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    request: Request,
) -> Result<Json<LedgerAccount>, AppError> {
    let req: CreateLedgerAccountRequest = read_json(request).await?;

    let account = state.db.create_ledger_account(
        &user.id,
        &NewLedgerAccount {
            code: req.code,
            name: req.name,
            description: req.description,
        },
    )?;

    state.db.log_audit(
        &user.id,
        "create",
        Some("ledger_account"),
        Some(account.id),
        Some(&format!("code={}, name={}", account.code, account.name)),
    )?;

    Ok(Json(account))
}

/// Request body for updating a ledger account; the code is immutable
#[derive(Debug, Deserialize)]
pub struct UpdateLedgerAccountRequest {
    #[serde(default, alias = "nombre")]
    pub name: Option<String>,
    /// An empty string clears the description
    #[serde(default, alias = "descripcion")]
    pub description: Option<String>,
}

/// PATCH /api/asientos/:id - Update name and/or description
pub async fn update_ledger_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    request: Request,
) -> Result<Json<LedgerAccount>, AppError> {
    let req: UpdateLedgerAccountRequest = read_json(request).await?;

    let account = state.db.update_ledger_account(
        &user.id,
        id,
        req.name.as_deref(),
        req.description.as_deref(),
    )?;

    state
        .db
        .log_audit(&user.id, "update", Some("ledger_account"), Some(id), None)?;

    Ok(Json(account))
}

/// DELETE /api/asientos/:id - Deactivate a ledger account
pub async fn delete_ledger_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.deactivate_ledger_account(&user.id, id)?;

    state.db.log_audit(
        &user.id,
        "deactivate",
        Some("ledger_account"),
        Some(id),
        None,
    )?;

    Ok(Json(SuccessResponse { success: true }))
}

/// Request body for chart generation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub tipo_actividad: String,
}

/// Response for chart generation; `asientos` is omitted when nothing was created
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub message: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asientos: Option<Vec<LedgerAccount>>,
}

/// POST /api/asientos/generate - Generate a chart of accounts for an activity
///
/// Codes the user already holds are skipped, so re-running is a no-op.
pub async fn generate_ledger_accounts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    request: Request,
) -> Result<Json<GenerateResponse>, AppError> {
    let req: GenerateRequest = read_json(request).await?;
    if req.tipo_actividad.trim().is_empty() {
        return Err(AppError::bad_request("tipoActividad is required"));
    }

    let ai = state.ai()?;
    let outcome = LedgerReconciler::new(&state.db, ai)
        .generate_chart_of_accounts(&user.id, &req.tipo_actividad)
        .await?;

    state.db.log_audit(
        &user.id,
        "generate",
        Some("ledger_account"),
        None,
        Some(&format!(
            "activity={}, inserted={}, skipped={}",
            req.tipo_actividad.trim(),
            outcome.count(),
            outcome.skipped_codes.len()
        )),
    )?;

    let count = outcome.count();
    let response = if count == 0 {
        GenerateResponse {
            message: "All proposed ledger accounts already exist".to_string(),
            count,
            asientos: None,
        }
    } else {
        info!(user = %user.id, count, "Created ledger accounts from AI proposal");
        GenerateResponse {
            message: format!("Created {} ledger accounts", count),
            count,
            asientos: Some(outcome.inserted),
        }
    };

    Ok(Json(response))
}

/// Transaction context for match mode
#[derive(Debug, Default, Deserialize)]
pub struct TransactionHint {
    #[serde(default)]
    pub descripcion: String,
}

/// Request body for suggestion; `isCreation` selects the mode
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    #[serde(default)]
    pub is_creation: bool,
    #[serde(default)]
    pub proposito: String,
    pub entidad: Option<String>,
    pub actividad: Option<String>,
    pub transaccion: Option<TransactionHint>,
}

impl From<SuggestRequest> for SuggestionRequest {
    fn from(req: SuggestRequest) -> Self {
        if req.is_creation {
            SuggestionRequest::Creation {
                purpose: req.proposito,
                entity: req.entidad,
                activity: req.actividad,
            }
        } else {
            SuggestionRequest::Match {
                description: req.transaccion.unwrap_or_default().descripcion,
                entity: req.entidad,
                activity: req.actividad,
            }
        }
    }
}

/// POST /api/asientos/suggest - Propose a new account or match an existing one
///
/// Creation mode answers `{code, name, description}` without persisting.
/// Match mode answers `{asientoId}`.
pub async fn suggest_ledger_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    request: Request,
) -> Result<Json<Suggestion>, AppError> {
    let req: SuggestRequest = read_json(request).await?;
    let suggestion_request = SuggestionRequest::from(req);

    let ai = state.ai()?;
    let suggestion = LedgerReconciler::new(&state.db, ai)
        .suggest(&user.id, &suggestion_request)
        .await?;

    let (mode, record_id) = match &suggestion {
        Suggestion::NewAccount(_) => ("creation", None),
        Suggestion::Existing { asiento_id } => ("match", Some(*asiento_id)),
    };
    state.db.log_audit(
        &user.id,
        "suggest",
        Some("ledger_account"),
        record_id,
        Some(&format!("mode={}", mode)),
    )?;

    Ok(Json(suggestion))
}
