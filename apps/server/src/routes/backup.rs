//! # Backup Route
//!
//! The endpoint an external scheduler hits for the daily backup. The
//! snapshot itself is transactionally consistent, so no coordination
//! with in-flight checkouts is needed.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/backup", post(run_backup))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupResponse {
    /// Where the snapshot landed.
    pub path: String,
}

/// POST /api/backup - write a snapshot into the configured backup
/// directory.
pub async fn run_backup(State(state): State<AppState>) -> Result<Json<BackupResponse>, ApiError> {
    let path = state.db.backup_to(&state.config.backup_dir).await?;

    info!(path = %path.display(), "Backup completed");
    Ok(Json(BackupResponse {
        path: path.display().to_string(),
    }))
}
