//! # Ledger Repository
//!
//! Append-only store of stock-affecting events.
//!
//! ```text
//! append()            ──► INSERT only. No UPDATE or DELETE exists here.
//! list_for_product()  ──► entries + rowid + supplier name, for replay
//! returned_quantity() ──► Σ return deltas booked against a sale
//! ```
//!
//! Entries are audit records: `resulting_balance` is the cached stock right
//! after the event and is not used to compute balances on replay.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use grox_core::{LedgerEntry, LedgerEventType};

/// A stored entry with the columns replay needs next to it.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredLedgerEntry {
    /// SQLite rowid; insertion order.
    pub seq: i64,
    pub supplier_name: Option<String>,
    #[sqlx(flatten)]
    pub entry: LedgerEntry,
}

#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Appends one entry.
    pub async fn append(&self, entry: &LedgerEntry) -> DbResult<()> {
        debug!(
            product_id = %entry.product_id,
            event_type = entry.event_type.as_str(),
            delta = entry.quantity_delta,
            balance = entry.resulting_balance,
            "Appending ledger entry"
        );

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                id, product_id, supplier_id, event_type,
                quantity_delta, resulting_balance,
                cost_price_cents, selling_price_cents,
                reference_id, reference_number, recorded_by, note,
                occurred_at, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11, ?12,
                ?13, ?14
            )
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.product_id)
        .bind(&entry.supplier_id)
        .bind(entry.event_type)
        .bind(entry.quantity_delta)
        .bind(entry.resulting_balance)
        .bind(entry.cost_price_cents)
        .bind(entry.selling_price_cents)
        .bind(&entry.reference_id)
        .bind(&entry.reference_number)
        .bind(&entry.recorded_by)
        .bind(&entry.note)
        .bind(entry.occurred_at)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All entries for a product in insertion order, optionally only those
    /// booked against `supplier_id`.
    pub async fn list_for_product(
        &self,
        product_id: &str,
        supplier_id: Option<&str>,
    ) -> DbResult<Vec<StoredLedgerEntry>> {
        let entries: Vec<StoredLedgerEntry> = sqlx::query_as(
            r#"
            SELECT
                l.rowid AS seq,
                sp.name AS supplier_name,
                l.id, l.product_id, l.supplier_id, l.event_type,
                l.quantity_delta, l.resulting_balance,
                l.cost_price_cents, l.selling_price_cents,
                l.reference_id, l.reference_number, l.recorded_by, l.note,
                l.occurred_at, l.created_at
            FROM ledger_entries l
            LEFT JOIN suppliers sp ON sp.id = l.supplier_id
            WHERE l.product_id = ?1 AND (?2 IS NULL OR l.supplier_id = ?2)
            ORDER BY l.rowid
            "#,
        )
        .bind(product_id)
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Units of `product_id` already returned against `sale_id`.
    pub async fn returned_quantity(&self, sale_id: &str, product_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(quantity_delta) FROM ledger_entries
            WHERE reference_id = ?1 AND product_id = ?2 AND event_type = ?3
            "#,
        )
        .bind(sale_id)
        .bind(product_id)
        .bind(LedgerEventType::Return)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Units returned against `sale_id` across all its products.
    pub async fn returned_units(&self, sale_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(quantity_delta) FROM ledger_entries WHERE reference_id = ?1 AND event_type = ?2",
        )
        .bind(sale_id)
        .bind(LedgerEventType::Return)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }
}
