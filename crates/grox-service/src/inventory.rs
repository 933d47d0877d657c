//! # Inventory Service
//!
//! Catalogue, suppliers and every stock movement that is not a sale.
//!
//! ```text
//! create_product(opening 12) ──► products + stock_levels(12) + adjustment(+12, "Opening stock")
//! stock_in(40 from Bidco)    ──► stock +40            + stock_in(+40, supplier, GRN no.)
//! adjust(-3, write_off)      ──► stock -3 (floor 0)   + stock_out(-3)
//! adjust(+2)                 ──► stock +2             + adjustment(+2)
//! ```
//!
//! Every movement writes a ledger entry, so replay from zero reaches the
//! same balance as the cached stock level.

use chrono::{NaiveDate, Utc};
use tracing::info;

use grox_core::dto::{
    AdjustmentRequest, LowStockRow, NewProductRequest, NewSupplierRequest, StockInRequest,
};
use grox_core::validation::{
    validate_adjustment_delta, validate_amount_cents, validate_markup_bps, validate_name,
    validate_quantity, validate_sku, validate_thresholds,
};
use grox_core::{
    generate_id, Actor, Capability, CoreError, LedgerEntry, LedgerEventType, Money, Product,
    Supplier, ValidationError,
};
use grox_db::Database;

use crate::error::ServiceResult;
use crate::new_ledger_entry;

/// Note on the ledger entry written for a product's initial stock.
pub const OPENING_STOCK_NOTE: &str = "Opening stock";

#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
}

impl InventoryService {
    pub fn new(db: Database) -> Self {
        InventoryService { db }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Registers a product with its opening stock.
    ///
    /// The selling price defaults to cost plus markup.
    pub async fn create_product(&self, actor: &Actor, request: &NewProductRequest) -> ServiceResult<Product> {
        actor.require(Capability::ManageProducts)?;

        validate_name("name", &request.name).map_err(CoreError::from)?;
        validate_sku(&request.sku).map_err(CoreError::from)?;
        validate_amount_cents("cost_price", request.cost_price).map_err(CoreError::from)?;
        validate_markup_bps(request.markup_bps).map_err(CoreError::from)?;
        validate_thresholds(request.min_quantity, request.max_quantity).map_err(CoreError::from)?;
        if let Some(price) = request.selling_price {
            validate_amount_cents("selling_price", price).map_err(CoreError::from)?;
        }
        if request.opening_stock < 0 {
            return Err(CoreError::from(ValidationError::MustNotBeNegative {
                field: "opening_stock".to_string(),
            })
            .into());
        }

        let cost = Money::from_cents(request.cost_price);
        let selling = request
            .selling_price
            .map(Money::from_cents)
            .unwrap_or_else(|| cost.with_markup_bps(request.markup_bps));

        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            name: request.name.trim().to_string(),
            sku: request.sku.trim().to_string(),
            category: request.category.clone(),
            cost_price_cents: cost.cents(),
            selling_price_cents: selling.cents(),
            markup_bps: request.markup_bps,
            min_quantity: request.min_quantity,
            max_quantity: request.max_quantity,
            expiry_date: request.expiry_date,
            sold_quantity: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.db.products().insert(&product).await?;
        let level = self.db.stock().create(&product.id, request.opening_stock).await?;

        if request.opening_stock > 0 {
            let mut entry = new_ledger_entry(
                &product.id,
                LedgerEventType::Adjustment,
                request.opening_stock,
                level.quantity,
            );
            entry.cost_price_cents = product.cost_price_cents;
            entry.selling_price_cents = product.selling_price_cents;
            entry.recorded_by = Some(actor.username.clone());
            entry.note = Some(OPENING_STOCK_NOTE.to_string());
            entry.occurred_at = now;
            self.db.ledger().append(&entry).await?;
        }

        info!(
            product_id = %product.id,
            sku = %product.sku,
            price = %selling,
            opening_stock = request.opening_stock,
            "Product created"
        );

        Ok(product)
    }

    /// Changes cost and markup; the selling price is recomputed unless given.
    pub async fn update_prices(
        &self,
        actor: &Actor,
        product_id: &str,
        cost_price: i64,
        markup_bps: u32,
        selling_price: Option<i64>,
    ) -> ServiceResult<Product> {
        actor.require(Capability::ManageProducts)?;

        validate_amount_cents("cost_price", cost_price).map_err(CoreError::from)?;
        validate_markup_bps(markup_bps).map_err(CoreError::from)?;
        if let Some(price) = selling_price {
            validate_amount_cents("selling_price", price).map_err(CoreError::from)?;
        }

        self.active_product(product_id).await?;

        let selling = selling_price
            .unwrap_or_else(|| Money::from_cents(cost_price).with_markup_bps(markup_bps).cents());
        self.db
            .products()
            .update_prices(product_id, cost_price, selling, markup_bps)
            .await?;

        info!(product_id = %product_id, cost = cost_price, price = selling, "Prices updated");
        self.get_product(product_id).await
    }

    /// Soft-deletes a product. History keeps referencing it.
    pub async fn deactivate_product(&self, actor: &Actor, product_id: &str) -> ServiceResult<()> {
        actor.require(Capability::ManageProducts)?;

        self.active_product(product_id).await?;
        self.db.products().soft_delete(product_id).await?;

        info!(product_id = %product_id, "Product deactivated");
        Ok(())
    }

    /// Any product by id, including deactivated ones.
    pub async fn get_product(&self, product_id: &str) -> ServiceResult<Product> {
        self.db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }

    pub async fn find_by_sku(&self, sku: &str) -> ServiceResult<Option<Product>> {
        Ok(self.db.products().get_by_sku(sku.trim()).await?)
    }

    pub async fn find_by_name(&self, name: &str) -> ServiceResult<Option<Product>> {
        Ok(self.db.products().get_by_name(name.trim()).await?)
    }

    async fn active_product(&self, product_id: &str) -> ServiceResult<Product> {
        match self.db.products().get_by_id(product_id).await? {
            Some(product) if product.is_active => Ok(product),
            _ => Err(CoreError::ProductNotFound(product_id.to_string()).into()),
        }
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    pub async fn create_supplier(&self, actor: &Actor, request: &NewSupplierRequest) -> ServiceResult<Supplier> {
        actor.require(Capability::ManageSuppliers)?;
        validate_name("name", &request.name).map_err(CoreError::from)?;

        let supplier = Supplier {
            id: generate_id(),
            name: request.name.trim().to_string(),
            phone: request.phone.clone(),
            email: request.email.clone(),
            created_at: Utc::now(),
        };
        self.db.suppliers().insert(&supplier).await?;

        info!(supplier_id = %supplier.id, name = %supplier.name, "Supplier created");
        Ok(supplier)
    }

    pub async fn get_supplier(&self, supplier_id: &str) -> ServiceResult<Supplier> {
        self.db
            .suppliers()
            .get_by_id(supplier_id)
            .await?
            .ok_or_else(|| CoreError::SupplierNotFound(supplier_id.to_string()).into())
    }

    pub async fn list_suppliers(&self) -> ServiceResult<Vec<Supplier>> {
        Ok(self.db.suppliers().list().await?)
    }

    // =========================================================================
    // Stock Movements
    // =========================================================================

    /// Receives goods, optionally from a supplier.
    pub async fn stock_in(&self, actor: &Actor, request: &StockInRequest) -> ServiceResult<LedgerEntry> {
        actor.require(Capability::ReceiveStock)?;
        validate_quantity(request.quantity).map_err(CoreError::from)?;
        if let Some(cost) = request.cost_price {
            validate_amount_cents("cost_price", cost).map_err(CoreError::from)?;
        }

        let product = self.active_product(&request.product_id).await?;
        if let Some(supplier_id) = &request.supplier_id {
            self.get_supplier(supplier_id).await?;
        }

        let balance = self
            .db
            .stock()
            .apply_increment(&product.id, request.quantity)
            .await?;

        let mut entry = new_ledger_entry(&product.id, LedgerEventType::StockIn, request.quantity, balance);
        entry.supplier_id = request.supplier_id.clone();
        entry.cost_price_cents = request.cost_price.unwrap_or(product.cost_price_cents);
        entry.selling_price_cents = product.selling_price_cents;
        entry.reference_id = Some(generate_id());
        entry.reference_number = request.reference_number.clone();
        entry.recorded_by = Some(actor.username.clone());
        entry.note = request.note.clone();
        if let Some(received_at) = request.received_at {
            entry.occurred_at = received_at;
        }
        self.db.ledger().append(&entry).await?;

        info!(
            product_id = %product.id,
            quantity = request.quantity,
            supplier_id = ?request.supplier_id,
            balance,
            "Stock received"
        );

        Ok(entry)
    }

    /// Applies a signed correction, or a write-off when `write_off` is set.
    pub async fn adjust(&self, actor: &Actor, request: &AdjustmentRequest) -> ServiceResult<LedgerEntry> {
        actor.require(Capability::AdjustStock)?;
        validate_adjustment_delta(request.delta).map_err(CoreError::from)?;
        if request.write_off && request.delta > 0 {
            return Err(CoreError::from(ValidationError::InvalidFormat {
                field: "delta".to_string(),
                reason: "a write-off must remove stock".to_string(),
            })
            .into());
        }

        let product = self.active_product(&request.product_id).await?;

        let balance = self
            .db
            .stock()
            .apply_adjustment(&product.id, request.delta)
            .await?;

        let event_type = if request.write_off {
            LedgerEventType::StockOut
        } else {
            LedgerEventType::Adjustment
        };
        let mut entry = new_ledger_entry(&product.id, event_type, request.delta, balance);
        entry.cost_price_cents = product.cost_price_cents;
        entry.selling_price_cents = product.selling_price_cents;
        entry.recorded_by = Some(actor.username.clone());
        entry.note = request.note.clone();
        self.db.ledger().append(&entry).await?;

        info!(
            product_id = %product.id,
            delta = request.delta,
            event_type = event_type.as_str(),
            balance,
            "Stock adjusted"
        );

        Ok(entry)
    }

    // =========================================================================
    // Stock Reports
    // =========================================================================

    /// Active products at or below their minimum quantity.
    pub async fn low_stock(&self, actor: &Actor) -> ServiceResult<Vec<LowStockRow>> {
        actor.require(Capability::ViewReports)?;
        Ok(self.db.products().list_below_minimum().await?)
    }

    /// Active products expiring on or before `day`.
    pub async fn expiring(&self, actor: &Actor, day: NaiveDate) -> ServiceResult<Vec<Product>> {
        actor.require(Capability::ViewReports)?;
        Ok(self.db.products().list_expiring(day).await?)
    }
}
