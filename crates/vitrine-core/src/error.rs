//! # Error Types
//!
//! Domain-specific error types for vitrine-core.
//!
//! ## Error Hierarchy
//! ```text
//! vitrine-core errors (this file)
//! ├── CoreError        - Business rule violations
//! └── ValidationError  - Input validation failures (rejected before the store)
//!
//! vitrine-store errors (separate crate)
//! └── StoreError       - Local persistence failures (fatal to the operation)
//!
//! vitrine-sync errors (separate crate)
//! ├── GatewayError     - Remote call failures (recovered by the engine)
//! └── SyncError        - Engine orchestration failures
//! ```
//!
//! A `ValidationError` aborts an operation before anything is written.
//! Remote-side failures never appear here: the sync layer absorbs them.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Sale is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Cancelling a sale that is not `Completed`
    /// - Cancelling a sale twice
    #[error("Sale {sale_id} is {current_status}, cannot perform operation")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: String,
    },

    /// Combined pricing rates reach or exceed 100%, so no markup exists.
    #[error("Combined rates of {total_bps} bps leave no sale margin")]
    RatesTooHigh { total_bps: u32 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a draft or patch doesn't meet requirements. They are
/// raised before business logic runs and before anything reaches the store.
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

    /// Monetary value must not be negative.
    #[error("{field} must not be negative")]
    NegativeAmount { field: String },

    /// Invalid format (e.g. malformed id).
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
        let err = CoreError::InvalidSaleStatus {
            sale_id: "abc".to_string(),
            current_status: "cancelled".to_string(),
        };
        assert_eq!(err.to_string(), "Sale abc is cancelled, cannot perform operation");
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
