//! # Validation Module
//!
//! Draft and patch validation. Runs before business logic and before
//! anything reaches the local store; a failure here means nothing was
//! written anywhere.

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum quantity of a single item in a sale.
///
/// Guards against typos (1000 instead of 10), not real-world orders.
pub const MAX_ITEM_QUANTITY: i64 = 999;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates an explicit product code from a draft.
///
/// Derived codes always pass; this guards hand-entered ones.
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    Ok(())
}

/// Validates a record id (UUID v4 string).
pub fn validate_record_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale item quantity: positive, at most [`MAX_ITEM_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates that a monetary field is not negative. Zero is allowed.
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::NegativeAmount {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a rate in basis points: 0% to 100%.
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
