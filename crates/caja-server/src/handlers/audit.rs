//! Audit log handlers

use std::sync::Arc;

use axum::{
    extract::State,
    Extension, Json,
};
use serde::Deserialize;

use crate::extract::ApiQuery;
use crate::{AppError, AppState, CurrentUser, MAX_PAGE_LIMIT};
use caja_core::AuditEntry;

/// Query parameters for audit log
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    #[serde(default = "default_audit_limit")]
    pub limit: i64,
}

fn default_audit_limit() -> i64 {
    100
}

/// GET /api/audit - List the caller's audit log entries
pub async fn list_audit_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(params): ApiQuery<AuditQuery>,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);

    let entries = state.db.list_audit_log(&user.id, limit)?;

    // Audit log - viewing the audit log itself
    state.db.log_audit(
        &user.id,
        "list",
        Some("audit_log"),
        None,
        Some(&format!("limit={}", limit)),
    )?;

    Ok(Json(entries))
}
