//! # Domain Types
//!
//! Entities persisted by grox-db and exchanged between the crates.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                                   │
//! │                                                                         │
//! │  ┌───────────────┐ 1──1 ┌───────────────┐                              │
//! │  │   Product     │──────│  StockLevel   │  cached on-hand (≥ 0)        │
//! │  │ sku (unique)  │      └───────────────┘                              │
//! │  └──────┬────────┘                                                      │
//! │         │ 1──N                                                          │
//! │  ┌──────▼────────┐      ┌───────────────┐ 1──N ┌───────────────┐       │
//! │  │ LedgerEntry   │ N──1 │     Sale      │──────│   SaleItem    │       │
//! │  │ append-only   │      │ invoice_number│      │  immutable    │       │
//! │  └──────┬────────┘      └───────────────┘      └───────────────┘       │
//! │         │ N──1                                                          │
//! │  ┌──────▼────────┐      ┌───────────────┐                              │
//! │  │   Supplier    │      │InvoiceSequence│  one counter per key         │
//! │  └───────────────┘      └───────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity carries a UUID v4 `id`; business identifiers (SKU, invoice
//! number, supplier name) are unique alongside it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

/// Generates a new entity id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Display name. Unique, also used as the ledger lookup key.
    pub name: String,

    /// Stock Keeping Unit.
    pub sku: String,

    pub category: Option<String>,

    /// Purchase cost per unit in cents.
    pub cost_price_cents: i64,

    /// Current selling price per unit in cents.
    pub selling_price_cents: i64,

    /// Markup over cost in basis points (2500 = 25%).
    pub markup_bps: u32,

    /// Low-stock threshold.
    pub min_quantity: i64,

    /// Optional overstock threshold.
    pub max_quantity: Option<i64>,

    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,

    /// Units sold over the product's lifetime.
    pub sold_quantity: i64,

    /// Soft-delete flag. Products referenced by sales are never removed.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }
}

// =============================================================================
// Stock Level
// =============================================================================

/// Cached on-hand quantity of a product.
///
/// Written only by the stock mutator. Treated as a hint by ledger
/// reconstruction, which recomputes the balance from history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockLevel {
    pub product_id: String,
    /// Never negative.
    pub quantity: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Supplier
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Status
// =============================================================================

/// Lifecycle of a sale.
///
/// ## Transitions
/// ```text
///   Pending ──► Completed ──► PartiallyReturned ──► FullyRefunded
///      │             │              ▲    │
///      ▼             │              └────┘ (further partial returns)
///   Cancelled        └──────────────────────► FullyRefunded
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,
    #[default]
    Completed,
    Cancelled,
    PartiallyReturned,
    FullyRefunded,
}

impl SaleStatus {
    /// Statuses whose lines count as stock leaving the shop.
    pub const STOCK_AFFECTING: [SaleStatus; 3] = [
        SaleStatus::Completed,
        SaleStatus::PartiallyReturned,
        SaleStatus::FullyRefunded,
    ];

    /// Storage/wire tag.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
            SaleStatus::PartiallyReturned => "partially_returned",
            SaleStatus::FullyRefunded => "fully_refunded",
        }
    }

    /// Whether lines of a sale in this status are replayed into the ledger.
    pub fn affects_stock(&self) -> bool {
        Self::STOCK_AFFECTING.contains(self)
    }

    /// Whether `self → next` is a legal forward move.
    pub fn can_transition_to(&self, next: SaleStatus) -> bool {
        use SaleStatus::*;
        matches!(
            (self, next),
            (Pending, Completed)
                | (Pending, Cancelled)
                | (Completed, PartiallyReturned)
                | (Completed, FullyRefunded)
                | (PartiallyReturned, PartiallyReturned)
                | (PartiallyReturned, FullyRefunded)
        )
    }
}

// =============================================================================
// Payment Mode
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Card,
    BankTransfer,
    MobileMoney,
    /// Sold on account; settled later.
    Credit,
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded checkout. Immutable except for `status`, `completed_at` and
/// `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Allocated by the invoice sequence; unique and never reassigned.
    pub invoice_number: i64,
    pub status: SaleStatus,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_mode: PaymentMode,
    /// User who rang up the sale.
    pub cashier: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// When the sale took stock. `None` while it is held.
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Instant the sale's lines left the shop; a held sale completed later
    /// moves stock at completion, not at creation.
    pub fn stock_moved_at(&self) -> DateTime<Utc> {
        self.completed_at.unwrap_or(self.created_at)
    }

    /// Human-readable invoice reference, e.g. `INV-000042`.
    pub fn invoice_label(&self) -> String {
        invoice_label(self.invoice_number)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Formats an invoice number the way it is printed and referenced in the ledger.
pub fn invoice_label(invoice_number: i64) -> String {
    format!("INV-{:06}", invoice_number)
}

// =============================================================================
// Sale Item
// =============================================================================

/// A sale line. Product data is snapshotted so later price edits do not
/// rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// Zero-based position in the cart.
    pub line_no: i64,
    pub product_id: String,
    pub sku_snapshot: String,
    pub name_snapshot: String,
    /// Price actually charged per unit.
    pub unit_price_cents: i64,
    /// Cost per unit at the time of sale.
    pub cost_price_cents: i64,
    pub quantity: i64,
    /// `quantity × unit_price_cents`.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Ledger Entry
// =============================================================================

/// Kind of stock-affecting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEventType {
    /// Goods received from a supplier.
    StockIn,
    /// Goods written off (damage, loss, internal use).
    StockOut,
    /// Goods sold at the till.
    Sale,
    /// Goods returned by a customer.
    Return,
    /// Signed count correction, including opening stock.
    Adjustment,
}

impl LedgerEventType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LedgerEventType::StockIn => "stock_in",
            LedgerEventType::StockOut => "stock_out",
            LedgerEventType::Sale => "sale",
            LedgerEventType::Return => "return",
            LedgerEventType::Adjustment => "adjustment",
        }
    }
}

/// Append-only audit record of one stock-affecting event for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LedgerEntry {
    pub id: String,
    pub product_id: String,
    pub supplier_id: Option<String>,
    pub event_type: LedgerEventType,
    /// Signed change: positive for stock in, negative for stock out.
    pub quantity_delta: i64,
    /// Cached stock right after the event was applied.
    pub resulting_balance: i64,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    /// Originating sale id or stock-in transaction id.
    pub reference_id: Option<String>,
    /// Printed reference (invoice label, supplier document number).
    pub reference_number: Option<String>,
    pub recorded_by: Option<String>,
    pub note: Option<String>,
    /// When the event happened (may predate `created_at` for backfilled receipts).
    #[ts(as = "String")]
    pub occurred_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Invoice Sequence
// =============================================================================

/// Counter row backing the sequence allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceSequence {
    pub key: String,
    /// Last value handed out. The next allocation returns `last_value + 1`.
    pub last_value: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
