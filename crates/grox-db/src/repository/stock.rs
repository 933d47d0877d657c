//! # Stock Repository
//!
//! The stock mutator: every change to `stock_levels` is one conditional
//! UPDATE that returns the new balance.
//!
//! ## Floor At Zero
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE stock_levels                                                    │
//! │     SET quantity = MAX(quantity - ?2, 0)                                │
//! │   WHERE product_id = ?1                                                 │
//! │  RETURNING quantity                                                     │
//! │                                                                         │
//! │  on hand 3, sell 5  ──► 0   (oversell succeeds; the ledger keeps the    │
//! │                              full 5 units, so the shortfall is visible) │
//! │  two tills, 1 unit  ──► 0   (never below zero, whatever the ordering)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `CHECK (quantity >= 0)` column constraint backs the clamp.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use grox_core::StockLevel;

#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Creates the stock row for a new product. Negative input is stored as 0.
    pub async fn create(&self, product_id: &str, quantity: i64) -> DbResult<StockLevel> {
        debug!(product_id = %product_id, quantity = quantity, "Creating stock level");

        let level: StockLevel = sqlx::query_as(
            r#"
            INSERT INTO stock_levels (product_id, quantity, updated_at)
            VALUES (?1, MAX(?2, 0), ?3)
            RETURNING product_id, quantity, updated_at
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(level)
    }

    pub async fn get(&self, product_id: &str) -> DbResult<Option<StockLevel>> {
        let level: Option<StockLevel> = sqlx::query_as(
            "SELECT product_id, quantity, updated_at FROM stock_levels WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(level)
    }

    /// Deducts sold units. Returns the new balance, floored at 0.
    pub async fn apply_sale_deduction(&self, product_id: &str, quantity: i64) -> DbResult<i64> {
        debug!(product_id = %product_id, quantity = quantity, "Deducting stock");

        self.update_returning(
            r#"
            UPDATE stock_levels
            SET quantity = MAX(quantity - ?2, 0), updated_at = ?3
            WHERE product_id = ?1
            RETURNING quantity
            "#,
            product_id,
            quantity,
        )
        .await
    }

    /// Adds received or returned units. Returns the new balance.
    pub async fn apply_increment(&self, product_id: &str, quantity: i64) -> DbResult<i64> {
        debug!(product_id = %product_id, quantity = quantity, "Incrementing stock");

        self.update_returning(
            r#"
            UPDATE stock_levels
            SET quantity = quantity + MAX(?2, 0), updated_at = ?3
            WHERE product_id = ?1
            RETURNING quantity
            "#,
            product_id,
            quantity,
        )
        .await
    }

    /// Applies a signed correction. Returns the new balance, floored at 0.
    pub async fn apply_adjustment(&self, product_id: &str, delta: i64) -> DbResult<i64> {
        debug!(product_id = %product_id, delta = delta, "Adjusting stock");

        self.update_returning(
            r#"
            UPDATE stock_levels
            SET quantity = MAX(quantity + ?2, 0), updated_at = ?3
            WHERE product_id = ?1
            RETURNING quantity
            "#,
            product_id,
            delta,
        )
        .await
    }

    async fn update_returning(&self, sql: &str, product_id: &str, amount: i64) -> DbResult<i64> {
        let balance: Option<i64> = sqlx::query_scalar(sql)
            .bind(product_id)
            .bind(amount)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        balance.ok_or_else(|| DbError::not_found("StockLevel", product_id))
    }
}
