//! # Error Types
//!
//! Domain-specific error types for shop-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shop-core errors (this file)                                           │
//! │  ├── CoreError        - Checkout/domain rule violations                 │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  shop-db errors (separate crate)                                        │
//! │  └── DbError          - Storage failures, stock floor, conflicts        │
//! │                                                                         │
//! │  Server errors (in app)                                                 │
//! │  └── ApiError         - What HTTP callers see (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Caller        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, amounts)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent checkout rule violations detected before anything
/// touches storage. They are reported to the caller, never retried.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A checkout was attempted with no line items.
    #[error("cart is empty")]
    EmptyCart,

    /// The caller-claimed total does not match the recomputed one.
    ///
    /// The cart's line items are the authority: `sum(qty * price)` minus
    /// discount, floored at zero. A claimed total that disagrees means the
    /// client is stale or lying, and the commit never starts.
    #[error("cart total mismatch: claimed {claimed_cents} cents, computed {computed_cents} cents")]
    TotalMismatch {
        claimed_cents: i64,
        computed_cents: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements. Used for
/// early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, unparseable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::TotalMismatch {
            claimed_cents: 2000,
            computed_cents: 1800,
        };
        assert_eq!(
            err.to_string(),
            "cart total mismatch: claimed 2000 cents, computed 1800 cents"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
