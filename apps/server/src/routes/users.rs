//! # User Routes
//!
//! Staff account listing and creation, for attribution and the
//! performance report. Passwords and sessions are handled by the
//! credential service, not here.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;
use shop_core::{Role, User};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/users", get(list).post(create))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub name: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// GET /api/users - all staff accounts, newest first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.db.users().list().await?;
    Ok(Json(users))
}

/// POST /api/users - create a staff account.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<User>, ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::validation("username is required"));
    }

    let user = state
        .db
        .users()
        .create(&req.username, req.name.as_deref(), req.role)
        .await?;

    info!(username = %user.username, "User created");
    Ok(Json(user))
}
