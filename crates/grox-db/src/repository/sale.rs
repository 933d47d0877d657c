//! # Sale Repository
//!
//! Database operations for sales and sale lines.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. RECORD                                                              │
//! │     └── insert_with_items() → sale + lines in ONE transaction           │
//! │         (status: completed; lines are never edited afterwards)          │
//! │                                                                         │
//! │  2. STATUS CHANGES (conditional on the current status)                  │
//! │     └── update_status(id, pending → completed | cancelled)              │
//! │         (completing stamps completed_at)                                │
//! │     └── update_status(id, completed → partially_returned | ...)         │
//! │                                                                         │
//! │  3. READ                                                                │
//! │     └── get_by_invoice_number() → retry detection                       │
//! │     └── sold_lines_for_product() → ledger replay                        │
//! │     └── revenue_between() → reports                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use grox_core::dto::RevenueSummary;
use grox_core::ledger::SoldLine;
use grox_core::{Sale, SaleItem, SaleStatus};

const SALE_COLUMNS: &str = r#"
    id, invoice_number, status,
    subtotal_cents, tax_cents, discount_cents, total_cents,
    payment_mode, cashier, created_at, completed_at, updated_at
"#;

/// `'completed', 'partially_returned', 'fully_refunded'`
fn stock_affecting_list() -> String {
    SaleStatus::STOCK_AFFECTING
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Writes a sale and its lines atomically.
    ///
    /// Either both land or neither does. A taken invoice number fails with a
    /// `UniqueViolation` on `sales.invoice_number`.
    pub async fn insert_with_items(&self, sale: &Sale, items: &[SaleItem]) -> DbResult<()> {
        debug!(
            id = %sale.id,
            invoice_number = sale.invoice_number,
            lines = items.len(),
            "Inserting sale"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, invoice_number, status,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                payment_mode, cashier, created_at, completed_at, updated_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12
            )
            "#,
        )
        .bind(&sale.id)
        .bind(sale.invoice_number)
        .bind(sale.status)
        .bind(sale.subtotal_cents)
        .bind(sale.tax_cents)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.payment_mode)
        .bind(&sale.cashier)
        .bind(sale.created_at)
        .bind(sale.completed_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, line_no, product_id,
                    sku_snapshot, name_snapshot,
                    unit_price_cents, cost_price_cents, quantity, subtotal_cents,
                    created_at
                ) VALUES (
                    ?1, ?2, ?3, ?4,
                    ?5, ?6,
                    ?7, ?8, ?9, ?10,
                    ?11
                )
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(item.line_no)
            .bind(&item.product_id)
            .bind(&item.sku_snapshot)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.cost_price_cents)
            .bind(item.quantity)
            .bind(item.subtotal_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Looks a sale up by invoice number. Used by callers retrying a
    /// checkout to find out whether the first attempt was recorded.
    pub async fn get_by_invoice_number(&self, invoice_number: i64) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE invoice_number = ?1", SALE_COLUMNS);

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(invoice_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Lines of a sale in cart order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items: Vec<SaleItem> = sqlx::query_as(
            r#"
            SELECT
                id, sale_id, line_no, product_id,
                sku_snapshot, name_snapshot,
                unit_price_cents, cost_price_cents, quantity, subtotal_cents,
                created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Moves a sale from `from` to `to`.
    ///
    /// Conditional on the stored status still being `from`, so two callers
    /// racing on the same sale cannot both win. Returns `false` when the
    /// sale is missing or its status already moved. Moving to `completed`
    /// also stamps `completed_at`.
    pub async fn update_status(&self, id: &str, from: SaleStatus, to: SaleStatus) -> DbResult<bool> {
        debug!(id = %id, from = from.as_str(), to = to.as_str(), "Updating sale status");

        let now = Utc::now();
        let completed_at = (to == SaleStatus::Completed).then_some(now);

        let result = sqlx::query(
            r#"
            UPDATE sales
            SET status = ?3, updated_at = ?4, completed_at = COALESCE(?5, completed_at)
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(now)
        .bind(completed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Lines selling `product_id` on sales whose status counts toward stock.
    ///
    /// `seq` is the line's rowid (insertion order). `sold_at` and
    /// `recorded_at` are when the sale took stock: its completion time, or
    /// its creation time for rows written before completion was stamped.
    pub async fn sold_lines_for_product(&self, product_id: &str) -> DbResult<Vec<SoldLine>> {
        let sql = format!(
            r#"
            SELECT
                si.rowid AS seq,
                si.sale_id AS sale_id,
                s.invoice_number AS invoice_number,
                s.status AS status,
                s.cashier AS cashier,
                si.quantity AS quantity,
                si.unit_price_cents AS unit_price_cents,
                si.cost_price_cents AS cost_price_cents,
                COALESCE(s.completed_at, s.created_at) AS sold_at,
                COALESCE(s.completed_at, si.created_at) AS recorded_at
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE si.product_id = ?1 AND s.status IN ({})
            ORDER BY si.rowid
            "#,
            stock_affecting_list()
        );

        let lines = sqlx::query_as::<_, SoldLine>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// Totals of stock-affecting sales created in `[from, to)`.
    ///
    /// Returns recorded against those sales are reported separately and
    /// taken off `net_total` and `gross_margin`.
    pub async fn revenue_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<RevenueSummary> {
        let statuses = stock_affecting_list();

        let totals_sql = format!(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(subtotal_cents), 0),
                COALESCE(SUM(tax_cents), 0),
                COALESCE(SUM(discount_cents), 0),
                COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2 AND status IN ({})
            "#,
            statuses
        );

        let (sale_count, subtotal, tax, discount, total): (i64, i64, i64, i64, i64) =
            sqlx::query_as(&totals_sql)
                .bind(from)
                .bind(to)
                .fetch_one(&self.pool)
                .await?;

        let margin_sql = format!(
            r#"
            SELECT COALESCE(SUM((si.unit_price_cents - si.cost_price_cents) * si.quantity), 0)
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.created_at >= ?1 AND s.created_at < ?2 AND s.status IN ({})
            "#,
            statuses
        );

        let sold_margin: i64 = sqlx::query_scalar(&margin_sql)
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await?;

        let returns_sql = format!(
            r#"
            SELECT
                COALESCE(SUM(l.quantity_delta * l.selling_price_cents), 0),
                COALESCE(SUM(l.quantity_delta * (l.selling_price_cents - l.cost_price_cents)), 0)
            FROM ledger_entries l
            JOIN sales s ON s.id = l.reference_id
            WHERE l.event_type = 'return'
              AND s.created_at >= ?1 AND s.created_at < ?2 AND s.status IN ({})
            "#,
            statuses
        );

        let (returns, returned_margin): (i64, i64) = sqlx::query_as(&returns_sql)
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await?;

        Ok(RevenueSummary {
            from,
            to,
            sale_count,
            subtotal,
            tax,
            discount,
            total,
            returns,
            net_total: total - returns,
            gross_margin: sold_margin - returned_margin,
        })
    }
}
