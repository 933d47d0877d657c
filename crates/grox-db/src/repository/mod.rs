//! # Repository Module
//!
//! Database repository implementations for Grox.
//!
//! ```text
//! Service                         Repository                 SQLite
//! ───────                         ──────────                 ──────
//! create_sale ──► sequences().next_invoice_number() ──► invoice_sequences
//!             ──► sales().insert_with_items()       ──► sales + sale_items
//!             ──► stock().apply_sale_deduction()    ──► stock_levels
//!             ──► ledger().append()                 ──► ledger_entries
//! get_ledger  ──► ledger().list_for_product()
//!             ──► sales().sold_lines_for_product()
//! ```
//!
//! Each repository holds a clone of the pool; every method is one statement
//! or one transaction.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalogue CRUD and report queries
//! - [`stock::StockRepository`] - Atomic on-hand mutations
//! - [`supplier::SupplierRepository`] - Supplier records
//! - [`sequence::SequenceRepository`] - Invoice number allocation
//! - [`sale::SaleRepository`] - Sales, sale lines and status changes
//! - [`ledger::LedgerRepository`] - Append-only stock ledger

pub mod ledger;
pub mod product;
pub mod sale;
pub mod sequence;
pub mod stock;
pub mod supplier;
