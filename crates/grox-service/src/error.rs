//! # Service Errors
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CoreError (validation, not found, permissions) ──┐                     │
//! │                                                   ▼                     │
//! │  DbError ──► unavailable? ──► StorageUnavailable  ServiceError          │
//! │          └─► invoice UNIQUE ─► DuplicateInvoice     │                   │
//! │                                                     │ after sale write: │
//! │                                                     │   PartialSale     │
//! │                                                     │ after return      │
//! │                                                     │ status move:      │
//! │                                                     │   PartialReturn   │
//! │                                                     ▼                   │
//! │                                  ApiError { code, message } ──► HTTP    │
//! │                                  (storage detail logged, not returned)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation failures are always raised before anything is written. A
//! failure after the sale row is written is reported as [`ServiceError::PartialSale`]
//! and is not rolled back; the sale keeps its invoice number. A return that
//! stops after the sale's status moved is reported as
//! [`ServiceError::PartialReturn`].

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use grox_core::CoreError;
use grox_db::DbError;

/// Errors returned by the services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business rule or validation failure. Nothing was written.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store could not be reached. Nothing was written by the failing step.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The allocated invoice number is already recorded. Not retried with a
    /// fresh number.
    #[error("Invoice number {0} is already recorded")]
    DuplicateInvoice(i64),

    /// The sale is recorded but applying it to stock stopped part way.
    ///
    /// `completed_lines` lines were fully applied (stock, ledger, sold count).
    #[error(
        "Sale {invoice_number} recorded but only {completed_lines} of {total_lines} lines were applied: {reason}"
    )]
    PartialSale {
        sale_id: String,
        invoice_number: i64,
        completed_lines: usize,
        total_lines: usize,
        reason: String,
    },

    /// The sale's status moved for a return but the return did not reach
    /// both stock and ledger.
    ///
    /// With `restocked` set, stock already holds the units but no `return`
    /// entry exists, so the units still count as returnable. Record the entry
    /// by hand rather than repeating the return.
    #[error(
        "Return of {quantity} x {product_id} on sale {sale_id} stopped part way (restocked: {restocked}): {reason}"
    )]
    PartialReturn {
        sale_id: String,
        product_id: String,
        quantity: i64,
        restocked: bool,
        reason: String,
    },

    /// Any other storage failure.
    #[error(transparent)]
    Db(DbError),
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        if err.is_unavailable() {
            ServiceError::StorageUnavailable(err.to_string())
        } else {
            ServiceError::Db(err)
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// API Error
// =============================================================================

/// Error shape returned to outer layers.
///
/// ```json
/// { "code": "NOT_FOUND", "message": "Product not found: Sugar 1kg" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
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

    /// Missing capability (403)
    Forbidden,

    /// Conflicts with stored state (409)
    Conflict,

    /// Sale recorded, stock application incomplete (207)
    PartialSale,

    /// Return started, stock or ledger not updated (207)
    PartialReturn,

    /// Store unreachable (503)
    StorageUnavailable,

    /// Any other storage or internal failure (500)
    Internal,
}

/// Message returned in place of storage error detail.
pub const STORAGE_ERROR_MESSAGE: &str = "A storage error occurred";

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    fn storage(code: ErrorCode, detail: &str) -> Self {
        error!(detail = %detail, "Storage error");
        ApiError::new(code, STORAGE_ERROR_MESSAGE)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(_)
            | CoreError::SaleNotFound(_)
            | CoreError::SupplierNotFound(_) => ErrorCode::NotFound,
            CoreError::EmptyCart
            | CoreError::InvalidItem { .. }
            | CoreError::TooManyLines { .. }
            | CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::InvalidStatusTransition { .. } | CoreError::ReturnExceedsSold { .. } => {
                ErrorCode::Conflict
            }
            CoreError::Forbidden { .. } => ErrorCode::Forbidden,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(core) => core.into(),
            ServiceError::StorageUnavailable(detail) => {
                ApiError::storage(ErrorCode::StorageUnavailable, &detail)
            }
            ServiceError::DuplicateInvoice(_) => ApiError::new(ErrorCode::Conflict, err.to_string()),
            ServiceError::PartialSale { .. } => {
                ApiError::new(ErrorCode::PartialSale, err.to_string())
            }
            ServiceError::PartialReturn { .. } => {
                ApiError::new(ErrorCode::PartialReturn, err.to_string())
            }
            ServiceError::Db(DbError::NotFound { entity, id }) => {
                ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", entity, id))
            }
            ServiceError::Db(DbError::UniqueViolation { field, .. }) => {
                ApiError::new(ErrorCode::Conflict, format!("{} already exists", field))
            }
            ServiceError::Db(db) => ApiError::storage(ErrorCode::Internal, &db.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
