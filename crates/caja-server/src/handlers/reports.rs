//! Report handlers

use std::sync::Arc;

use axum::{
    extract::State,
    Extension, Json,
};
use serde::Deserialize;

use crate::extract::ApiQuery;
use crate::{AppError, AppState, CurrentUser};
use caja_core::models::TransactionDetail;
use caja_core::TransactionReportFilter;

/// Query parameters for the balance detail report
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDetailQuery {
    pub entidad_id: Option<i64>,
    pub cuenta_bancaria_id: Option<i64>,
    #[serde(default)]
    pub incluir_planificadas: bool,
}

/// GET /api/reportes/saldos/detalle - Transactions behind one balance cell
pub async fn report_balance_detail(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(params): ApiQuery<BalanceDetailQuery>,
) -> Result<Json<Vec<TransactionDetail>>, AppError> {
    let (Some(entity_id), Some(bank_account_id)) = (params.entidad_id, params.cuenta_bancaria_id)
    else {
        return Err(AppError::bad_request(
            "entidadId and cuentaBancariaId are required",
        ));
    };

    let filter = TransactionReportFilter {
        entity_id,
        bank_account_id,
        include_planned: params.incluir_planificadas,
    };
    let rows = state.db.report_transactions(&user.id, &filter)?;

    state.db.log_audit(
        &user.id,
        "report",
        Some("balance_detail"),
        None,
        Some(&format!(
            "entity={}, account={}, include_planned={}, count={}",
            entity_id,
            bank_account_id,
            params.incluir_planificadas,
            rows.len()
        )),
    )?;

    Ok(Json(rows))
}
