//! Session handlers

use axum::{Extension, Json};
use serde::Serialize;

use crate::CurrentUser;

/// Response for the /api/me endpoint
#[derive(Serialize)]
pub struct MeResponse {
    /// The user id every request is scoped to
    pub user: String,
    /// How the user was authenticated
    pub auth_method: String,
}

/// GET /api/me - Get the currently authenticated user
pub async fn get_me(Extension(user): Extension<CurrentUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user: user.id,
        auth_method: user.auth_method.to_string(),
    })
}
