//! # Sale Pricing
//!
//! The pure half of the sale recorder: cart validation, price resolution and
//! totals. The service layer resolves products, allocates the invoice number
//! and persists what [`SaleDraft::into_records`] returns.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CreateSaleRequest                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_cart()        EmptyCart / InvalidItem   (no writes yet)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  resolve products       ProductNotFound            (reads only)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleDraft::build()     unit price = request price ?? selling price     │
//! │       │                 subtotal_i = qty_i × unit_price_i               │
//! │       │                 total = Σ subtotal_i + tax − discount           │
//! │       ▼                                                                 │
//! │  next invoice number ──► into_records() ──► INSERT sale + items         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::dto::SaleItemRequest;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{generate_id, PaymentMode, Product, Sale, SaleItem, SaleStatus};
use crate::validation::{validate_amount_cents, validate_quantity};
use crate::MAX_SALE_LINES;

// =============================================================================
// Cart Validation
// =============================================================================

/// A cart line that passed shape validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
    /// Price typed in at the till, overriding the catalogue price.
    pub unit_price: Option<Money>,
}

/// Checks that the cart is non-empty and every line is complete.
///
/// ## Errors
/// - [`CoreError::EmptyCart`] for no lines
/// - [`CoreError::TooManyLines`] above [`MAX_SALE_LINES`]
/// - [`CoreError::InvalidItem`] for a missing product id or quantity, a
///   quantity outside `1..=MAX_LINE_QUANTITY`, or a negative price
pub fn validate_cart(items: &[SaleItemRequest]) -> CoreResult<Vec<CartLine>> {
    if items.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    if items.len() > MAX_SALE_LINES {
        return Err(CoreError::TooManyLines {
            max: MAX_SALE_LINES,
        });
    }

    items
        .iter()
        .enumerate()
        .map(|(line, item)| {
            let product_id = item
                .product_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| CoreError::invalid_item(line, "productId is required"))?;

            let quantity = item
                .quantity
                .ok_or_else(|| CoreError::invalid_item(line, "quantity is required"))?;
            validate_quantity(quantity).map_err(|e| CoreError::invalid_item(line, e.to_string()))?;

            if let Some(price) = item.price {
                validate_amount_cents("price", price)
                    .map_err(|e| CoreError::invalid_item(line, e.to_string()))?;
            }

            Ok(CartLine {
                product_id: product_id.to_string(),
                quantity,
                unit_price: item.price.map(Money::from_cents),
            })
        })
        .collect()
}

// =============================================================================
// Totals
// =============================================================================

/// Sale totals. Tax and discount are flat amounts; discount applies after tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl SaleTotals {
    /// `total = Σ line_subtotals + tax − discount`.
    ///
    /// Rejects negative tax/discount and a discount larger than
    /// `subtotal + tax`.
    pub fn compute(line_subtotals: &[Money], tax: Money, discount: Money) -> CoreResult<Self> {
        validate_amount_cents("tax", tax.cents())?;
        validate_amount_cents("discount", discount.cents())?;

        let subtotal = line_subtotals
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(*line))
            .ok_or_else(|| overflow("subtotal"))?;

        let gross = subtotal.checked_add(tax).ok_or_else(|| overflow("total"))?;

        if discount > gross {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: gross.cents(),
            }
            .into());
        }

        Ok(SaleTotals {
            subtotal,
            tax,
            discount,
            total: gross - discount,
        })
    }
}

fn overflow(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Sale Draft
// =============================================================================

/// A priced cart line with its product snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub cost_price: Money,
    pub subtotal: Money,
}

/// Everything needed to write a sale except its identity and invoice number.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDraft {
    pub lines: Vec<PricedLine>,
    pub totals: SaleTotals,
}

impl SaleDraft {
    /// Prices validated cart lines against resolved products.
    ///
    /// `resolve` returns the active product for an id, or `None`.
    pub fn build<'a, F>(
        lines: &[CartLine],
        mut resolve: F,
        tax: Money,
        discount: Money,
    ) -> CoreResult<Self>
    where
        F: FnMut(&str) -> Option<&'a Product>,
    {
        let mut priced = Vec::with_capacity(lines.len());

        for (line_no, line) in lines.iter().enumerate() {
            let product = resolve(&line.product_id)
                .filter(|p| p.is_active)
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let unit_price = line.unit_price.unwrap_or_else(|| product.selling_price());
            let subtotal = unit_price
                .checked_mul_quantity(line.quantity)
                .ok_or_else(|| CoreError::invalid_item(line_no, "line subtotal overflows"))?;

            priced.push(PricedLine {
                product_id: product.id.clone(),
                sku: product.sku.clone(),
                name: product.name.clone(),
                quantity: line.quantity,
                unit_price,
                cost_price: product.cost_price(),
                subtotal,
            });
        }

        let subtotals: Vec<Money> = priced.iter().map(|l| l.subtotal).collect();
        let totals = SaleTotals::compute(&subtotals, tax, discount)?;

        Ok(SaleDraft {
            lines: priced,
            totals,
        })
    }

    /// Materialises the sale record and its immutable lines.
    pub fn into_records(
        self,
        invoice_number: i64,
        payment_mode: PaymentMode,
        cashier: Option<String>,
        now: DateTime<Utc>,
    ) -> (Sale, Vec<SaleItem>) {
        let sale_id = generate_id();

        let items = self
            .lines
            .into_iter()
            .enumerate()
            .map(|(line_no, line)| SaleItem {
                id: generate_id(),
                sale_id: sale_id.clone(),
                line_no: line_no as i64,
                product_id: line.product_id,
                sku_snapshot: line.sku,
                name_snapshot: line.name,
                unit_price_cents: line.unit_price.cents(),
                cost_price_cents: line.cost_price.cents(),
                quantity: line.quantity,
                subtotal_cents: line.subtotal.cents(),
                created_at: now,
            })
            .collect();

        let sale = Sale {
            id: sale_id,
            invoice_number,
            status: SaleStatus::Completed,
            subtotal_cents: self.totals.subtotal.cents(),
            tax_cents: self.totals.tax.cents(),
            discount_cents: self.totals.discount.cents(),
            total_cents: self.totals.total.cents(),
            payment_mode,
            cashier,
            created_at: now,
            completed_at: Some(now),
            updated_at: now,
        };

        (sale, items)
    }
}

// =============================================================================
// Returns
// =============================================================================

/// Units of a product still returnable on a sale.
pub fn returnable_quantity(sold: i64, already_returned: i64) -> i64 {
    (sold - already_returned).max(0)
}

/// Status a sale moves to once `returned_units` of its `sold_units` are back.
pub fn status_after_return(sold_units: i64, returned_units: i64) -> SaleStatus {
    if returned_units >= sold_units {
        SaleStatus::FullyRefunded
    } else {
        SaleStatus::PartiallyReturned
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
