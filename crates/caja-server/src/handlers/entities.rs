//! Entity management handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::extract::{ApiPath, ApiQuery};
use crate::{read_json, AppError, AppState, CurrentUser, SuccessResponse};
use caja_core::models::Entity;

/// Query parameters for listing entities, bank accounts and ledger accounts
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Include deactivated records
    #[serde(default, alias = "include_inactive")]
    pub include_inactive: bool,
}

/// GET /api/entidades - List entities
pub async fn list_entities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(params): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Entity>>, AppError> {
    let entities = state.db.list_entities(&user.id, params.include_inactive)?;

    state.db.log_audit(
        &user.id,
        "list",
        Some("entity"),
        None,
        Some(&format!(
            "include_inactive={}, count={}",
            params.include_inactive,
            entities.len()
        )),
    )?;

    Ok(Json(entities))
}

/// Request body for creating or renaming an entity
#[derive(Debug, Deserialize)]
pub struct EntityRequest {
    #[serde(alias = "nombre")]
    pub name: String,
}

/// POST /api/entidades - Create an entity (or reactivate one with the same name)
pub async fn create_entity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    request: Request,
) -> Result<Json<Entity>, AppError> {
    let req: EntityRequest = read_json(request).await?;

    let entity = state.db.create_entity(&user.id, &req.name)?;

    state.db.log_audit(
        &user.id,
        "create",
        Some("entity"),
        Some(entity.id),
        Some(&format!("name={}", entity.name)),
    )?;

    Ok(Json(entity))
}

/// PATCH /api/entidades/:id - Rename an entity
pub async fn update_entity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    request: Request,
) -> Result<Json<Entity>, AppError> {
    let req: EntityRequest = read_json(request).await?;

    state.db.rename_entity(&user.id, id, &req.name)?;

    state.db.log_audit(
        &user.id,
        "update",
        Some("entity"),
        Some(id),
        Some(&format!("name={}", req.name.trim())),
    )?;

    let entity = state
        .db
        .get_entity(&user.id, id)?
        .ok_or_else(|| AppError::not_found("Entity not found"))?;

    Ok(Json(entity))
}

/// DELETE /api/entidades/:id - Deactivate an entity
pub async fn delete_entity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.deactivate_entity(&user.id, id)?;

    state
        .db
        .log_audit(&user.id, "deactivate", Some("entity"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}
