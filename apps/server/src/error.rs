//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in ProShop                                │
//! │                                                                         │
//! │  Handler returns Result<T, ApiError>                                    │
//! │         │                                                               │
//! │         ├── CoreError (pricing/validation) ──┐                          │
//! │         ├── DbError (storage, stock floor) ──┤                          │
//! │         │                                    ▼                          │
//! │         │                             ApiError { code, message }        │
//! │         │                                    │                          │
//! │         ▼                                    ▼                          │
//! │  200 + JSON body                 status + {"code","message"} JSON       │
//! │                                                                         │
//! │  The status split is what the register UI keys off:                     │
//! │    400/404/422  →  "fix your cart"   (don't retry as-is)                │
//! │    503          →  "try again"       (transient contention)             │
//! │    500          →  service fault, nothing partial was written           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use shop_core::CoreError;
use shop_db::DbError;

/// API error returned from HTTP handlers.
///
/// ## Serialization
/// This is what the caller receives when a request fails:
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "insufficient stock for product …: available 1, requested 2"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// A line item cannot be covered by on-hand stock (422)
    InsufficientStock,

    /// Transient write contention; retry the whole checkout (503)
    CommitConflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// The HTTP status this code maps to.
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InsufficientStock => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::CommitConflict => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.http_status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{field} '{value}' already exists"),
            ),
            err @ DbError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            DbError::Busy | DbError::PoolExhausted => ApiError::new(
                ErrorCode::CommitConflict,
                "store is busy, retry the request",
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {message}");
                ApiError::new(ErrorCode::ValidationError, "invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {e}");
                ApiError::new(ErrorCode::DatabaseError, "database operation failed")
            }
            DbError::BackupFailed(e) => {
                tracing::error!("Backup failed: {e}");
                ApiError::new(ErrorCode::DatabaseError, "backup failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {e}");
                ApiError::new(ErrorCode::DatabaseError, "database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
///
/// Everything shop-core rejects is caller input: the register fixes the
/// cart, it does not retry.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::ValidationError.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::InsufficientStock.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::CommitConflict.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_insufficient_stock_is_distinguishable() {
        let api: ApiError = DbError::InsufficientStock {
            product_id: "p1".to_string(),
            available: 1,
            requested: 2,
        }
        .into();

        assert_eq!(api.code, ErrorCode::InsufficientStock);
        assert!(api.message.contains("available 1"));
    }

    #[test]
    fn test_busy_maps_to_commit_conflict() {
        let api: ApiError = DbError::Busy.into();
        assert_eq!(api.code, ErrorCode::CommitConflict);
    }
}
