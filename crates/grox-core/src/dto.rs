//! # Wire Types
//!
//! Request and response shapes exchanged with the HTTP layer and the React
//! admin pages. JSON uses camelCase; all money is in cents.
//!
//! ```text
//! POST /sales            CreateSaleRequest  ──► SaleReceipt
//! GET  /ledger/{name}    ?supplierId=...    ──► LedgerResponse
//! POST /stock-in         StockInRequest     ──► LedgerEntry
//! POST /sales/{id}/returns ReturnRequest    ──► SaleReceipt
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{LedgerEventType, PaymentMode, Sale, SaleStatus};

// =============================================================================
// Sales
// =============================================================================

/// One cart line as submitted. Fields are optional so that missing values
/// surface as `InvalidItem` instead of a deserialization failure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemRequest {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
    /// Unit price override in cents; the catalogue price is used when absent.
    pub price: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub items: Vec<SaleItemRequest>,
    pub payment_mode: PaymentMode,
    /// Flat tax amount in cents.
    #[serde(default)]
    pub tax: Option<i64>,
    /// Flat discount in cents, applied after tax.
    #[serde(default)]
    pub discount: Option<i64>,
    /// Park the sale as pending. Stock moves once it is completed.
    #[serde(default)]
    pub hold: bool,
}

/// Returned after a successful checkout or status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub id: String,
    pub invoice_number: i64,
    pub invoice_label: String,
    pub status: SaleStatus,
    pub subtotal: i64,
    pub tax: i64,
    pub discount: i64,
    pub total: i64,
    pub item_count: usize,
}

impl SaleReceipt {
    pub fn new(sale: &Sale, item_count: usize) -> Self {
        SaleReceipt {
            id: sale.id.clone(),
            invoice_number: sale.invoice_number,
            invoice_label: sale.invoice_label(),
            status: sale.status,
            subtotal: sale.subtotal_cents,
            tax: sale.tax_cents,
            discount: sale.discount_cents,
            total: sale.total_cents,
            item_count,
        }
    }
}

/// Customer return against a recorded sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub note: Option<String>,
}

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProductRequest {
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub cost_price: i64,
    /// Derived from cost and markup when absent.
    pub selling_price: Option<i64>,
    #[serde(default)]
    pub markup_bps: u32,
    #[serde(default)]
    pub min_quantity: i64,
    pub max_quantity: Option<i64>,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    /// Units on hand when the product is registered.
    #[serde(default)]
    pub opening_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplierRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Goods received from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockInRequest {
    pub product_id: String,
    pub supplier_id: Option<String>,
    pub quantity: i64,
    /// Cost per unit on this delivery; product cost when absent.
    pub cost_price: Option<i64>,
    /// Supplier document number (GRN, delivery note, ...).
    pub reference_number: Option<String>,
    pub note: Option<String>,
    /// Backdated receipt time; now when absent.
    #[ts(as = "Option<String>")]
    pub received_at: Option<DateTime<Utc>>,
}

/// Manual stock correction. Negative deltas with `write_off` are recorded as
/// stock-out (damage, loss), others as adjustments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRequest {
    pub product_id: String,
    pub delta: i64,
    #[serde(default)]
    pub write_off: bool,
    pub note: Option<String>,
}

// =============================================================================
// Ledger
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Direction {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

/// One row of the reconstructed ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRow {
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub event_type: LedgerEventType,
    pub reference_number: Option<String>,
    pub supplier_name: Option<String>,
    pub cashier: Option<String>,
    pub quantity_in: i64,
    pub quantity_out: i64,
    pub cost_price: i64,
    pub selling_price: i64,
    pub note: Option<String>,
    /// Running balance after this row.
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LedgerResponse {
    /// Product name.
    pub product: String,
    /// Replayed balance, independent of the cached stock level.
    pub current_stock: i64,
    /// Cached stock level, for drift checks.
    pub cached_stock: Option<i64>,
    pub ledger: Vec<LedgerRow>,
}

// =============================================================================
// Reports
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    #[ts(as = "String")]
    pub from: DateTime<Utc>,
    #[ts(as = "String")]
    pub to: DateTime<Utc>,
    pub sale_count: i64,
    pub subtotal: i64,
    pub tax: i64,
    pub discount: i64,
    /// Charged totals, returns not deducted.
    pub total: i64,
    /// Units taken back against the period's sales, at the unit price
    /// charged (before tax and discount).
    pub returns: i64,
    /// `total - returns`.
    pub net_total: i64,
    /// Σ (unit price − cost) × quantity over the period's lines, less the
    /// margin on returned units.
    pub gross_margin: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LowStockRow {
    pub product_id: String,
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub min_quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sale_request_from_json() {
        let json = r#"{
            "items": [{"productId": "p-1", "quantity": 2}, {"productId": "p-2", "quantity": 1, "price": 450}],
            "paymentMode": "mobile_money",
            "tax": 90
        }"#;
        let request: CreateSaleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.items.len(), 2);
        assert_eq!(request.items[1].price, Some(450));
        assert_eq!(request.payment_mode, PaymentMode::MobileMoney);
        assert_eq!(request.tax, Some(90));
        assert_eq!(request.discount, None);
        assert!(!request.hold);
    }

    #[test]
    fn test_missing_quantity_still_deserializes() {
        let json = r#"{"items": [{"productId": "p-1"}], "paymentMode": "cash"}"#;
        let request: CreateSaleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.items[0].quantity, None);
    }

    #[test]
    fn test_ledger_row_uses_in_out_type() {
        let row = LedgerRow {
            date: Utc::now(),
            direction: Direction::Out,
            event_type: LedgerEventType::Sale,
            reference_number: Some("INV-000001".to_string()),
            supplier_name: None,
            cashier: Some("amina".to_string()),
            quantity_in: 0,
            quantity_out: 3,
            cost_price: 100,
            selling_price: 150,
            note: None,
            balance: 7,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["type"], "OUT");
        assert_eq!(value["eventType"], "sale");
        assert_eq!(value["quantityOut"], 3);
        assert_eq!(value["referenceNumber"], "INV-000001");
    }
}
