//! # Sequence Repository
//!
//! Allocates invoice numbers.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Terminal A ──┐                                                         │
//! │  Terminal B ──┼──► INSERT INTO invoice_sequences (key, last_value)      │
//! │  Terminal C ──┘        VALUES (?1, 1)                                   │
//! │                    ON CONFLICT (key)                                    │
//! │                    DO UPDATE SET last_value = last_value + 1            │
//! │                    RETURNING last_value                                 │
//! │                                                                         │
//! │  One statement: SQLite serialises writers, so each caller gets its own  │
//! │  value. Reading MAX(invoice_number) + 1 instead would hand the same     │
//! │  number to two callers that read before either writes.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counter lives in the database, so numbering continues across
//! restarts. Values are never reused, even if the sale that took one is
//! never written.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use grox_core::InvoiceSequence;

#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

impl SequenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// Returns the next value for `key`, starting at 1.
    ///
    /// Strictly greater than every value previously returned for `key`.
    pub async fn next_invoice_number(&self, key: &str) -> DbResult<i64> {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO invoice_sequences (key, last_value)
            VALUES (?1, 1)
            ON CONFLICT (key) DO UPDATE SET last_value = last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;

        debug!(key = %key, value = value, "Allocated invoice number");
        Ok(value)
    }

    /// Last value handed out for `key`, if any.
    pub async fn current(&self, key: &str) -> DbResult<Option<i64>> {
        let row: Option<InvoiceSequence> =
            sqlx::query_as("SELECT key, last_value FROM invoice_sequences WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| r.last_value))
    }
}
