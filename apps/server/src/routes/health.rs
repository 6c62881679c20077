//! Health check endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

/// GET /api/health - liveness probe, checks the database answers.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    if !state.db.health_check().await {
        return Err(ApiError::internal("database unavailable"));
    }
    Ok(Json(HealthResponse { status: "ok" }))
}
