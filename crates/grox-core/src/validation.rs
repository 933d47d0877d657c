//! # Validation Module
//!
//! Field-level checks run before anything reaches the database.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: HTTP layer (external)   - JSON shape, auth                    │
//! │  Layer 2: THIS MODULE             - values, ranges, formats             │
//! │  Layer 3: SQLite                  - UNIQUE, FK, CHECK (quantity >= 0)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use grox_core::validation::{validate_sku, validate_quantity};
//!
//! assert!(validate_sku("RICE-5KG").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU: 1-50 chars of letters, digits, `-` or `_`.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (product or supplier): non-empty, at most 200 chars.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line/movement quantity: `1..=MAX_LINE_QUANTITY`.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a non-negative amount in cents (prices, flat tax, flat discount).
///
/// Zero is allowed (free items, no tax).
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a markup in basis points: at most 100000 (1000%).
pub fn validate_markup_bps(bps: u32) -> ValidationResult<()> {
    if bps > 100_000 {
        return Err(ValidationError::OutOfRange {
            field: "markup".to_string(),
            min: 0,
            max: 100_000,
        });
    }

    Ok(())
}

/// Validates stock thresholds: `min >= 0` and `max >= min` when present.
pub fn validate_thresholds(min: i64, max: Option<i64>) -> ValidationResult<()> {
    if min < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "min_quantity".to_string(),
        });
    }

    if let Some(max) = max {
        if max < min {
            return Err(ValidationError::OutOfRange {
                field: "max_quantity".to_string(),
                min,
                max: i64::MAX,
            });
        }
    }

    Ok(())
}

/// Validates a signed adjustment delta: non-zero and within the line limit.
pub fn validate_adjustment_delta(delta: i64) -> ValidationResult<()> {
    if delta == 0 || delta.abs() > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: -MAX_LINE_QUANTITY,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("RICE-5KG").is_ok());
        assert!(validate_sku("milk_1l").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Basmati Rice 5kg").is_ok());
        assert!(matches!(
            validate_name("name", " "),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_name("name", &"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount_cents("tax", 0).is_ok());
        assert!(validate_amount_cents("tax", 125).is_ok());
        assert!(validate_amount_cents("discount", -1).is_err());
    }

    #[test]
    fn test_validate_thresholds() {
        assert!(validate_thresholds(0, None).is_ok());
        assert!(validate_thresholds(5, Some(50)).is_ok());
        assert!(validate_thresholds(-1, None).is_err());
        assert!(validate_thresholds(10, Some(5)).is_err());
    }

    #[test]
    fn test_validate_adjustment_delta() {
        assert!(validate_adjustment_delta(-4).is_ok());
        assert!(validate_adjustment_delta(7).is_ok());
        assert!(validate_adjustment_delta(0).is_err());
    }
}
