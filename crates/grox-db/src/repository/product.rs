//! # Product Repository
//!
//! Catalogue records and the product-side report queries.
//!
//! ## Key Operations
//! - Insert / lookup by id, SKU or name
//! - Price updates and soft delete
//! - `sold_quantity` counter bumped at checkout
//! - Low-stock and expiry listings for the reports

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use grox_core::dto::LowStockRow;
use grox_core::Product;

const PRODUCT_COLUMNS: &str = r#"
    id, name, sku, category,
    cost_price_cents, selling_price_cents, markup_bps,
    min_quantity, max_quantity, expiry_date,
    sold_quantity, is_active, created_at, updated_at
"#;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// A taken SKU or name fails with [`DbError::UniqueViolation`].
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, sku, category,
                cost_price_cents, selling_price_cents, markup_bps,
                min_quantity, max_quantity, expiry_date,
                sold_quantity, is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12, ?13, ?14
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.category)
        .bind(product.cost_price_cents)
        .bind(product.selling_price_cents)
        .bind(product.markup_bps)
        .bind(product.min_quantity)
        .bind(product.max_quantity)
        .bind(product.expiry_date)
        .bind(product.sold_quantity)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        self.fetch_one_where("id = ?1", id).await
    }

    /// Gets an active product by SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        self.fetch_one_where("sku = ?1 AND is_active = 1", sku).await
    }

    /// Gets a product by its display name (the ledger lookup key).
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        self.fetch_one_where("name = ?1", name).await
    }

    /// Loads the active products among `ids`, in no particular order.
    pub async fn get_active_many(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM products WHERE is_active = 1 AND id IN ({})",
            PRODUCT_COLUMNS, placeholders
        );

        let mut query = sqlx::query_as::<_, Product>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Updates cost, selling price and markup.
    pub async fn update_prices(
        &self,
        id: &str,
        cost_price_cents: i64,
        selling_price_cents: i64,
        markup_bps: u32,
    ) -> DbResult<()> {
        debug!(id = %id, cost = cost_price_cents, price = selling_price_cents, "Updating prices");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET cost_price_cents = ?2,
                selling_price_cents = ?3,
                markup_bps = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(cost_price_cents)
        .bind(selling_price_cents)
        .bind(markup_bps)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product. Sales and ledger rows keep referencing it.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Adds `quantity` to the lifetime sold counter.
    pub async fn increment_sold(&self, id: &str, quantity: i64) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET sold_quantity = sold_quantity + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Active products whose cached stock is at or below `min_quantity`.
    pub async fn list_below_minimum(&self) -> DbResult<Vec<LowStockRow>> {
        let rows: Vec<(String, String, String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT p.id, p.name, p.sku, s.quantity, p.min_quantity
            FROM products p
            JOIN stock_levels s ON s.product_id = p.id
            WHERE p.is_active = 1 AND s.quantity <= p.min_quantity
            ORDER BY s.quantity ASC, p.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, name, sku, quantity, min_quantity)| LowStockRow {
                product_id,
                name,
                sku,
                quantity,
                min_quantity,
            })
            .collect())
    }

    /// Active products with an expiry date on or before `day`.
    pub async fn list_expiring(&self, day: NaiveDate) -> DbResult<Vec<Product>> {
        let sql = format!(
            r#"
            SELECT {} FROM products
            WHERE is_active = 1 AND expiry_date IS NOT NULL AND expiry_date <= ?1
            ORDER BY expiry_date ASC, name ASC
            "#,
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(day)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn fetch_one_where(&self, condition: &str, value: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE {}", PRODUCT_COLUMNS, condition);

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }
}
