//! Transaction handlers: CRUD, realization and due planned payments

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extract::{ApiPath, ApiQuery};
use crate::{read_json, AppError, AppState, CurrentUser, SuccessResponse, MAX_PAGE_LIMIT};
use caja_core::datetime::due_cutoff;
use caja_core::models::{NewTransaction, Transaction, TransactionState};

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    /// PLANIFICADA or REAL
    #[serde(alias = "estado")]
    pub state: Option<String>,
}

fn default_limit() -> i64 {
    50
}

/// GET /api/transacciones - List transactions newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(params): ApiQuery<TransactionQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    // Input validation: clamp pagination parameters
    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);
    let offset = params.offset.max(0);

    let tx_state = params
        .state
        .as_deref()
        .map(str::parse::<TransactionState>)
        .transpose()
        .map_err(|e| AppError::bad_request(&e))?;

    let transactions = state
        .db
        .list_transactions(&user.id, tx_state, limit, offset)?;

    state.db.log_audit(
        &user.id,
        "list",
        Some("transaction"),
        None,
        Some(&format!(
            "state={:?}, limit={}, offset={}, count={}",
            tx_state,
            limit,
            offset,
            transactions.len()
        )),
    )?;

    Ok(Json(transactions))
}

/// GET /api/transacciones/:id - Get one transaction
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Transaction>, AppError> {
    let transaction = state
        .db
        .get_transaction(&user.id, id)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;

    state
        .db
        .log_audit(&user.id, "view", Some("transaction"), Some(id), None)?;

    Ok(Json(transaction))
}

/// POST /api/transacciones - Record a REAL or PLANIFICADA transaction
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    request: Request,
) -> Result<Json<Transaction>, AppError> {
    let new: NewTransaction = read_json(request).await?;

    let transaction = state.db.create_transaction(&user.id, &new)?;

    state.db.log_audit(
        &user.id,
        "create",
        Some("transaction"),
        Some(transaction.id),
        Some(&format!(
            "state={}, direction={}, amount={} {}",
            transaction.state, transaction.direction, transaction.amount, transaction.currency
        )),
    )?;

    Ok(Json(transaction))
}

/// DELETE /api/transacciones/:id - Delete a transaction
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_transaction(&user.id, id)?;

    state
        .db
        .log_audit(&user.id, "delete", Some("transaction"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}

/// Request body for marking a planned transaction as realized
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRealizedRequest {
    /// Defaults to now
    pub fecha_real: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct MarkRealizedResponse {
    pub success: bool,
    pub transaccion: Transaction,
}

/// PATCH /api/transacciones/:id/marcar-realizada - PLANIFICADA -> REAL
///
/// An empty body realizes the transaction now.
pub async fn mark_realized(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    request: Request,
) -> Result<Json<MarkRealizedResponse>, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), crate::MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: MarkRealizedRequest = if bytes.iter().all(u8::is_ascii_whitespace) {
        MarkRealizedRequest::default()
    } else {
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?
    };

    let transaction = state.db.confirm_realized(&user.id, id, req.fecha_real)?;

    state.db.log_audit(
        &user.id,
        "realize",
        Some("transaction"),
        Some(id),
        Some(&format!("date={}", transaction.date.to_rfc3339())),
    )?;

    Ok(Json(MarkRealizedResponse {
        success: true,
        transaccion: transaction,
    }))
}

/// Query parameters for due planned transactions
#[derive(Debug, Deserialize)]
pub struct DueQuery {
    #[serde(default = "default_due_days")]
    pub dias: u32,
}

fn default_due_days() -> u32 {
    7
}

/// Longest look-ahead accepted for the due window
const MAX_DUE_DAYS: u32 = 366;

/// GET /api/transacciones/vencimientos - Planned transactions due within N days
///
/// Overdue planned transactions are included; "today" is local to the
/// configured timezone.
pub async fn list_due_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(params): ApiQuery<DueQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let days = params.dias.min(MAX_DUE_DAYS);
    let cutoff = due_cutoff(Utc::now(), state.timezone, days);

    let due = state.db.list_due_planned(&user.id, cutoff)?;

    state.db.log_audit(
        &user.id,
        "list",
        Some("transaction"),
        None,
        Some(&format!("due_within_days={}, count={}", days, due.len())),
    )?;

    Ok(Json(due))
}
