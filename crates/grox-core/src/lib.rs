//! # grox-core: Pure Business Logic for Grox
//!
//! The invoice, stock and ledger rules of Grox as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Grox Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            HTTP layer + React admin pages (external)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ dto::CreateSaleRequest, ...            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                grox-service (orchestration)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ grox-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  sale   │ │  stock  │ │ ledger  │ │  perms  │  │   │
//! │  │   │ Product │ │ pricing │ │  clamp  │ │ replay  │ │  tags   │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  grox-db (SQLite repositories)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, Sale, LedgerEntry, ...)
//! - [`money`] - Integer-cents money type
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation rules
//! - [`sale`] - Cart validation and sale totals
//! - [`stock`] - Stock floor arithmetic
//! - [`ledger`] - Ledger reconstruction (running balance replay)
//! - [`permissions`] - Capability tags
//! - [`dto`] - Wire shapes consumed/produced by the HTTP layer
//!
//! ## Example Usage
//!
//! ```rust
//! use grox_core::sale::SaleTotals;
//! use grox_core::Money;
//!
//! let totals = SaleTotals::compute(
//!     &[Money::from_cents(1000), Money::from_cents(250)],
//!     Money::from_cents(100),
//!     Money::from_cents(50),
//! )
//! .unwrap();
//!
//! assert_eq!(totals.total.cents(), 1300);
//! ```

pub mod dto;
pub mod error;
pub mod ledger;
pub mod money;
pub mod permissions;
pub mod sale;
pub mod stock;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use permissions::{Actor, Capability, PermissionSet};
pub use types::*;

/// Sequence key used for sale invoices unless configured otherwise.
pub const DEFAULT_INVOICE_SEQUENCE_KEY: &str = "sales.invoice";

/// Maximum lines allowed in a single sale.
pub const MAX_SALE_LINES: usize = 200;

/// Maximum quantity of a single line.
///
/// Guards against typos such as 1000 instead of 10 at the till.
pub const MAX_LINE_QUANTITY: i64 = 100_000;
