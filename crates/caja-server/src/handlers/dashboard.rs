//! Dashboard handlers

use std::sync::Arc;

use axum::{
    extract::State,
    Extension, Json,
};
use serde::Deserialize;

use crate::extract::ApiQuery;
use crate::{AppError, AppState, CurrentUser, MAX_PAGE_LIMIT};
use caja_core::models::TransactionSummary;
use caja_core::BalanceSheet;

/// GET /api/dashboard/saldos - Balance grid by entity, bank account and currency
pub async fn get_balances(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<BalanceSheet>, AppError> {
    let sheet = state.db.balance_sheet(&user.id)?;

    state.db.log_audit(
        &user.id,
        "view",
        Some("dashboard"),
        None,
        Some(&format!(
            "entities={}, accounts={}",
            sheet.entidades.len(),
            sheet.cuentas.len()
        )),
    )?;

    Ok(Json(sheet))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_recent_limit")]
    pub limit: i64,
}

fn default_recent_limit() -> i64 {
    10
}

/// GET /api/dashboard/transactions - Most recent transactions, flattened
pub async fn recent_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(params): ApiQuery<RecentQuery>,
) -> Result<Json<Vec<TransactionSummary>>, AppError> {
    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);

    let summaries = state.db.recent_transaction_summaries(&user.id, limit)?;

    state.db.log_audit(
        &user.id,
        "list",
        Some("dashboard"),
        None,
        Some(&format!("limit={}", limit)),
    )?;

    Ok(Json(summaries))
}
