//! # grox-service: Grox Point-of-Sale Services
//!
//! Orchestrates grox-core rules over grox-db storage. This is the layer an
//! HTTP server or the admin pages call into.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          grox-service                                   │
//! │                                                                         │
//! │  GroxConfig::load() ──► Grox::open() ──► Database (pool + migrations)   │
//! │                              │                                          │
//! │        ┌─────────────┬───────┴───────┬──────────────┐                   │
//! │        ▼             ▼               ▼              ▼                   │
//! │   SaleService  InventoryService  LedgerService  ReportService           │
//! │   checkout     products          replay         revenue                 │
//! │   returns      suppliers         drift check    margin                  │
//! │   pending      stock in / adjust                                        │
//! │        │             │               │              │                   │
//! │        └─────────────┴───────┬───────┴──────────────┘                   │
//! │                              ▼                                          │
//! │                  ServiceError ──► ApiError                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let grox = Grox::open(GroxConfig::load()?).await?;
//! let sale = grox.sales().create_sale(&actor, &request).await?;
//! let ledger = grox.ledger().get_ledger(&actor, "Sugar 1kg", None).await?;
//! ```

pub mod config;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod reports;
pub mod sales;

pub use config::{ConfigError, GroxConfig};
pub use error::{ApiError, ErrorCode, ServiceError, ServiceResult};
pub use inventory::InventoryService;
pub use ledger::LedgerService;
pub use reports::ReportService;
pub use sales::{RecordedSale, SaleService};

use chrono::Utc;
use tracing::info;

use grox_core::{generate_id, LedgerEntry, LedgerEventType};
use grox_db::Database;

/// Entry point holding the database handle and configuration.
///
/// Cloning is cheap; services share the pool.
#[derive(Debug, Clone)]
pub struct Grox {
    db: Database,
    config: GroxConfig,
}

impl Grox {
    /// Opens the database and applies migrations.
    pub async fn open(config: GroxConfig) -> ServiceResult<Self> {
        let db = Database::new(config.db_config()).await?;

        info!(
            path = %config.database_path.display(),
            sequence_key = %config.invoice_sequence_key,
            balance_policy = %config.ledger_balance_policy,
            "Grox services ready"
        );

        Ok(Grox { db, config })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &GroxConfig {
        &self.config
    }

    pub fn sales(&self) -> SaleService {
        SaleService::new(self.db.clone(), self.config.invoice_sequence_key.clone())
    }

    pub fn inventory(&self) -> InventoryService {
        InventoryService::new(self.db.clone())
    }

    pub fn ledger(&self) -> LedgerService {
        LedgerService::new(self.db.clone(), self.config.ledger_balance_policy)
    }

    pub fn reports(&self) -> ReportService {
        ReportService::new(self.db.clone())
    }
}

/// A ledger entry stamped now, with prices and references left for the
/// caller to fill in.
pub(crate) fn new_ledger_entry(
    product_id: &str,
    event_type: LedgerEventType,
    delta: i64,
    balance: i64,
) -> LedgerEntry {
    let now = Utc::now();
    LedgerEntry {
        id: generate_id(),
        product_id: product_id.to_string(),
        supplier_id: None,
        event_type,
        quantity_delta: delta,
        resulting_balance: balance,
        cost_price_cents: 0,
        selling_price_cents: 0,
        reference_id: None,
        reference_number: None,
        recorded_by: None,
        note: None,
        occurred_at: now,
        created_at: now,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use grox_core::dto::NewProductRequest;
    use grox_core::{generate_id, Actor, PermissionSet, Product};

    use crate::{Grox, GroxConfig};

    pub async fn memory_grox() -> Grox {
        Grox::open(GroxConfig::in_memory()).await.unwrap()
    }

    /// File-backed store with a multi-connection pool, for racing callers.
    pub async fn file_grox() -> Grox {
        let mut config = GroxConfig::in_memory();
        config.database_path =
            std::env::temp_dir().join(format!("grox-service-test-{}.db", generate_id()));
        config.max_connections = 8;
        Grox::open(config).await.unwrap()
    }

    /// Registers a product costing 100 with the given price and opening stock.
    pub async fn product(grox: &Grox, sku: &str, selling_price: i64, opening_stock: i64) -> Product {
        grox.inventory()
            .create_product(
                &Actor::system(),
                &NewProductRequest {
                    name: format!("Product {}", sku),
                    sku: sku.to_string(),
                    category: None,
                    cost_price: 100,
                    selling_price: Some(selling_price),
                    markup_bps: 5000,
                    min_quantity: 2,
                    max_quantity: None,
                    expiry_date: None,
                    opening_stock,
                },
            )
            .await
            .unwrap()
    }

    pub fn cashier() -> Actor {
        Actor::new(
            "amina",
            PermissionSet::new(["sales:create", "sales:return", "ledger:read"]),
        )
    }
}
