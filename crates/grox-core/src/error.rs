//! # Error Types
//!
//! Domain-specific error types for grox-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  grox-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  grox-db errors                                                        │
//! │  └── DbError          - Storage failures                               │
//! │                                                                         │
//! │  grox-service errors                                                   │
//! │  ├── ServiceError     - Operation failures (incl. PartialSale)         │
//! │  └── ApiError         - What the HTTP layer serializes                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::SaleStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// Every variant is detected before anything is written.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale was submitted without any line items.
    #[error("Cart is empty")]
    EmptyCart,

    /// A line item is missing a field or carries an unusable value.
    ///
    /// `line` is the zero-based position in the submitted cart.
    #[error("Invalid item at line {line}: {reason}")]
    InvalidItem { line: usize, reason: String },

    /// Product cannot be resolved (unknown id/name or soft-deleted).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale cannot be resolved by id or invoice number.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Supplier cannot be resolved.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),

    /// Sale status may only move forward along the allowed transitions.
    #[error("Sale cannot move from {from:?} to {to:?}")]
    InvalidStatusTransition { from: SaleStatus, to: SaleStatus },

    /// Returned quantity would exceed what is still outstanding on the sale.
    #[error("Cannot return {requested} of {product_id}: only {returnable} returnable")]
    ReturnExceedsSold {
        product_id: String,
        requested: i64,
        returnable: i64,
    },

    /// Caller lacks the capability for the operation.
    #[error("Missing permission: {capability}")]
    Forbidden { capability: String },

    /// Sale has more lines than allowed.
    #[error("Sale cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidItem error for a cart line.
    pub fn invalid_item(line: usize, reason: impl Into<String>) -> Self {
        CoreError::InvalidItem {
            line,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
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

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. unknown enum tag).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
