//! # grox-db: Database Layer for Grox
//!
//! SQLite persistence for the invoice sequence, sales, stock levels and the
//! stock ledger, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Grox Data Flow                                │
//! │                                                                         │
//! │  grox-service (SaleService, InventoryService, LedgerService)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     grox-db (THIS CRATE)                        │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐   │    │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │   │    │
//! │  │   │   (pool.rs)   │◄───│ sequence stock │    │  (embedded)  │   │    │
//! │  │   │  SqlitePool   │    │ sale ledger    │    │ 001_init.sql │   │    │
//! │  │   │  WAL, FKs on  │    │ product supplier│   │              │   │    │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘   │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (GROX_DATABASE_PATH)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomic Statements
//!
//! The two contended operations are single SQL statements, so concurrent
//! callers never read-modify-write:
//!
//! - invoice numbers: `INSERT .. ON CONFLICT DO UPDATE SET last_value =
//!   last_value + 1 RETURNING last_value`
//! - stock deduction: `UPDATE .. SET quantity = MAX(quantity - ?, 0)
//!   RETURNING quantity`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use grox_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("grox.db")).await?;
//! let invoice = db.sequences().next_invoice_number("sales.invoice").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::ledger::LedgerRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::sequence::SequenceRepository;
pub use repository::stock::StockRepository;
pub use repository::supplier::SupplierRepository;

#[cfg(test)]
pub(crate) mod test_support {
    use grox_core::{generate_id, Product};

    use crate::{Database, DbConfig};

    pub async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// File-backed database with a real multi-connection pool, for tests
    /// that race writers against each other.
    pub async fn file_db() -> Database {
        let path = std::env::temp_dir().join(format!("grox-db-test-{}.db", generate_id()));
        Database::new(DbConfig::new(path).max_connections(8))
            .await
            .unwrap()
    }

    /// Inserts an active product with a stock row holding `on_hand` units.
    pub async fn seed_product(db: &Database, sku: &str, on_hand: i64) -> Product {
        let now = chrono::Utc::now();
        let product = Product {
            id: generate_id(),
            name: format!("Product {}", sku),
            sku: sku.to_string(),
            category: None,
            cost_price_cents: 100,
            selling_price_cents: 150,
            markup_bps: 5000,
            min_quantity: 2,
            max_quantity: None,
            expiry_date: None,
            sold_quantity: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        db.stock().create(&product.id, on_hand).await.unwrap();
        product
    }
}
