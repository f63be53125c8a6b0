//! Bank account handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Extension, Json,
};
use serde::Deserialize;

use super::entities::ListQuery;
use crate::extract::{ApiPath, ApiQuery};
use crate::{read_json, AppError, AppState, CurrentUser, SuccessResponse};
use caja_core::models::BankAccount;

/// GET /api/cuentas - List bank accounts
pub async fn list_bank_accounts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(params): ApiQuery<ListQuery>,
) -> Result<Json<Vec<BankAccount>>, AppError> {
    let accounts = state
        .db
        .list_bank_accounts(&user.id, params.include_inactive)?;

    state.db.log_audit(
        &user.id,
        "list",
        Some("bank_account"),
        None,
        Some(&format!("count={}", accounts.len())),
    )?;

    Ok(Json(accounts))
}

/// Request body for creating or updating a bank account
#[derive(Debug, Deserialize)]
pub struct BankAccountRequest {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "banco")]
    pub bank: String,
}

/// POST /api/cuentas - Create a bank account
pub async fn create_bank_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    request: Request,
) -> Result<Json<BankAccount>, AppError> {
    let req: BankAccountRequest = read_json(request).await?;

    let account = state
        .db
        .create_bank_account(&user.id, &req.name, &req.bank)?;

    state.db.log_audit(
        &user.id,
        "create",
        Some("bank_account"),
        Some(account.id),
        Some(&format!("name={}, bank={}", account.name, account.bank)),
    )?;

    Ok(Json(account))
}

/// PATCH /api/cuentas/:id - Rename a bank account or change its bank label
pub async fn update_bank_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    request: Request,
) -> Result<Json<BankAccount>, AppError> {
    let req: BankAccountRequest = read_json(request).await?;

    state
        .db
        .update_bank_account(&user.id, id, &req.name, &req.bank)?;

    state
        .db
        .log_audit(&user.id, "update", Some("bank_account"), Some(id), None)?;

    let account = state
        .db
        .get_bank_account(&user.id, id)?
        .ok_or_else(|| AppError::not_found("Bank account not found"))?;

    Ok(Json(account))
}

/// DELETE /api/cuentas/:id - Deactivate a bank account
pub async fn delete_bank_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.deactivate_bank_account(&user.id, id)?;

    state
        .db
        .log_audit(&user.id, "deactivate", Some("bank_account"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}
