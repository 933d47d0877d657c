//! # Sale Service
//!
//! Checkout and everything that happens to a sale afterwards.
//!
//! ## Checkout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale(request)                                                   │
//! │                                                                         │
//! │  1. validate_cart + resolve products + price   ── errors: nothing       │
//! │                                                   written               │
//! │  2. sequences().next_invoice_number(key)       ── atomic; the number    │
//! │                                                   is spent from here on │
//! │  3. sales().insert_with_items(sale, lines)     ── one transaction       │
//! │  ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ │
//! │  4. per line:                                     failures from here    │
//! │       stock().apply_sale_deduction()   floor 0    on are PartialSale;   │
//! │       ledger().append(sale entry)                 the sale stays        │
//! │       products().increment_sold()                 recorded              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 3 and 4 are separate writes. A caller that lost the response can
//! look the sale up with [`SaleService::find_sale_by_invoice`] before
//! retrying. The ledger replays sale lines, not sale entries, so a sale whose
//! step 4 never ran still shows up in the stock history.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, error, info};

use grox_core::dto::{CreateSaleRequest, ReturnRequest, SaleReceipt};
use grox_core::sale::{returnable_quantity, status_after_return, validate_cart, SaleDraft};
use grox_core::validation::validate_quantity;
use grox_core::{
    Actor, Capability, CoreError, LedgerEventType, Money, Product, Sale, SaleItem, SaleStatus,
};
use grox_db::Database;

use crate::error::{ServiceError, ServiceResult};
use crate::new_ledger_entry;

/// A recorded sale with its lines.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

impl RecordedSale {
    pub fn receipt(&self) -> SaleReceipt {
        SaleReceipt::new(&self.sale, self.items.len())
    }
}

#[derive(Debug, Clone)]
pub struct SaleService {
    db: Database,
    sequence_key: String,
}

impl SaleService {
    pub fn new(db: Database, sequence_key: impl Into<String>) -> Self {
        SaleService {
            db,
            sequence_key: sequence_key.into(),
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Records a sale and applies it to stock.
    ///
    /// Held sales (`request.hold`) are stored as pending and leave stock
    /// untouched until [`complete_pending`](Self::complete_pending).
    pub async fn create_sale(
        &self,
        actor: &Actor,
        request: &CreateSaleRequest,
    ) -> ServiceResult<RecordedSale> {
        actor.require(Capability::CreateSale)?;

        let lines = validate_cart(&request.items)?;

        let mut ids: Vec<String> = lines.iter().map(|l| l.product_id.clone()).collect();
        ids.sort();
        ids.dedup();
        let products: HashMap<String, Product> = self
            .db
            .products()
            .get_active_many(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let draft = SaleDraft::build(
            &lines,
            |id| products.get(id),
            Money::from_cents(request.tax.unwrap_or(0)),
            Money::from_cents(request.discount.unwrap_or(0)),
        )?;

        let invoice_number = self
            .db
            .sequences()
            .next_invoice_number(&self.sequence_key)
            .await?;

        let (mut sale, items) = draft.into_records(
            invoice_number,
            request.payment_mode,
            Some(actor.username.clone()),
            Utc::now(),
        );
        if request.hold {
            sale.status = SaleStatus::Pending;
            sale.completed_at = None;
        }

        self.db
            .sales()
            .insert_with_items(&sale, &items)
            .await
            .map_err(|err| {
                if err.is_unique_violation_on("sales.invoice_number") {
                    error!(invoice_number, "Allocated invoice number already recorded");
                    ServiceError::DuplicateInvoice(invoice_number)
                } else {
                    err.into()
                }
            })?;

        if sale.status.affects_stock() {
            self.apply_to_stock(&sale, &items).await?;
        }

        info!(
            sale_id = %sale.id,
            invoice = %sale.invoice_label(),
            status = sale.status.as_str(),
            total = %sale.total(),
            lines = items.len(),
            "Sale recorded"
        );

        Ok(RecordedSale { sale, items })
    }

    /// Deducts stock, appends a sale ledger entry and bumps the sold counter
    /// for each line, in cart order.
    async fn apply_to_stock(&self, sale: &Sale, items: &[SaleItem]) -> ServiceResult<()> {
        for (done, item) in items.iter().enumerate() {
            if let Err(err) = self.apply_line(sale, item).await {
                error!(
                    sale_id = %sale.id,
                    invoice_number = sale.invoice_number,
                    line = item.line_no,
                    error = %err,
                    "Sale recorded but stock update stopped"
                );
                return Err(ServiceError::PartialSale {
                    sale_id: sale.id.clone(),
                    invoice_number: sale.invoice_number,
                    completed_lines: done,
                    total_lines: items.len(),
                    reason: err.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn apply_line(&self, sale: &Sale, item: &SaleItem) -> ServiceResult<()> {
        let balance = self
            .db
            .stock()
            .apply_sale_deduction(&item.product_id, item.quantity)
            .await?;

        if balance == 0 {
            debug!(product_id = %item.product_id, "Stock exhausted by sale");
        }

        let mut entry = new_ledger_entry(
            &item.product_id,
            LedgerEventType::Sale,
            -item.quantity,
            balance,
        );
        entry.cost_price_cents = item.cost_price_cents;
        entry.selling_price_cents = item.unit_price_cents;
        entry.reference_id = Some(sale.id.clone());
        entry.reference_number = Some(sale.invoice_label());
        entry.recorded_by = sale.cashier.clone();
        entry.occurred_at = sale.stock_moved_at();
        self.db.ledger().append(&entry).await?;

        self.db
            .products()
            .increment_sold(&item.product_id, item.quantity)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Status Changes
    // =========================================================================

    /// Completes a held sale and applies it to stock as of now.
    pub async fn complete_pending(&self, actor: &Actor, sale_id: &str) -> ServiceResult<RecordedSale> {
        actor.require(Capability::ManageSales)?;

        self.transition(sale_id, SaleStatus::Completed).await?;
        let sale = self.load(sale_id).await?;
        let items = self.db.sales().get_items(sale_id).await?;

        self.apply_to_stock(&sale, &items).await?;

        info!(sale_id = %sale.id, invoice = %sale.invoice_label(), "Pending sale completed");
        Ok(RecordedSale { sale, items })
    }

    /// Cancels a held sale. Its invoice number stays spent.
    pub async fn cancel(&self, actor: &Actor, sale_id: &str) -> ServiceResult<Sale> {
        actor.require(Capability::ManageSales)?;

        let mut sale = self.transition(sale_id, SaleStatus::Cancelled).await?;

        info!(sale_id = %sale.id, invoice = %sale.invoice_label(), "Sale cancelled");
        sale.status = SaleStatus::Cancelled;
        Ok(sale)
    }

    /// Loads a sale and moves it to `to`. Returns the sale as it was before.
    async fn transition(&self, sale_id: &str, to: SaleStatus) -> ServiceResult<Sale> {
        let sale = self.load(sale_id).await?;

        if !sale.status.can_transition_to(to) {
            return Err(CoreError::InvalidStatusTransition {
                from: sale.status,
                to,
            }
            .into());
        }

        if !self.db.sales().update_status(sale_id, sale.status, to).await? {
            // Someone else moved it first.
            let current = self.load(sale_id).await?;
            return Err(CoreError::InvalidStatusTransition {
                from: current.status,
                to,
            }
            .into());
        }

        Ok(sale)
    }

    // =========================================================================
    // Returns
    // =========================================================================

    /// Takes units of one product back against a sale.
    ///
    /// The quantity may not exceed what was sold minus what was already
    /// returned. Stock goes up, a `return` entry is appended and the sale
    /// advances to partially returned or fully refunded. Sale lines are not
    /// modified. A failure after the status moved is
    /// [`ServiceError::PartialReturn`].
    pub async fn record_return(&self, actor: &Actor, request: &ReturnRequest) -> ServiceResult<SaleReceipt> {
        actor.require(Capability::RecordReturn)?;
        validate_quantity(request.quantity).map_err(CoreError::from)?;

        let sale = self.load(&request.sale_id).await?;
        let items = self.db.sales().get_items(&sale.id).await?;

        let sold: i64 = items
            .iter()
            .filter(|i| i.product_id == request.product_id)
            .map(|i| i.quantity)
            .sum();
        let already = self
            .db
            .ledger()
            .returned_quantity(&sale.id, &request.product_id)
            .await?;
        let returnable = returnable_quantity(sold, already);
        if request.quantity > returnable {
            return Err(CoreError::ReturnExceedsSold {
                product_id: request.product_id.clone(),
                requested: request.quantity,
                returnable,
            }
            .into());
        }

        let sale_units: i64 = items.iter().map(|i| i.quantity).sum();
        let returned_units = self.db.ledger().returned_units(&sale.id).await?;
        let next = status_after_return(sale_units, returned_units + request.quantity);
        self.transition(&sale.id, next).await?;

        let partial = |restocked: bool, err: ServiceError| {
            error!(
                sale_id = %sale.id,
                product_id = %request.product_id,
                quantity = request.quantity,
                restocked,
                error = %err,
                "Return stopped after the sale status moved"
            );
            ServiceError::PartialReturn {
                sale_id: sale.id.clone(),
                product_id: request.product_id.clone(),
                quantity: request.quantity,
                restocked,
                reason: err.to_string(),
            }
        };

        let balance = match self
            .db
            .stock()
            .apply_increment(&request.product_id, request.quantity)
            .await
        {
            Ok(balance) => balance,
            Err(err) => return Err(partial(false, err.into())),
        };

        let line = items.iter().find(|i| i.product_id == request.product_id);
        let mut entry = new_ledger_entry(
            &request.product_id,
            LedgerEventType::Return,
            request.quantity,
            balance,
        );
        entry.cost_price_cents = line.map(|l| l.cost_price_cents).unwrap_or(0);
        entry.selling_price_cents = line.map(|l| l.unit_price_cents).unwrap_or(0);
        entry.reference_id = Some(sale.id.clone());
        entry.reference_number = Some(sale.invoice_label());
        entry.recorded_by = Some(actor.username.clone());
        entry.note = request.note.clone();
        if let Err(err) = self.db.ledger().append(&entry).await {
            return Err(partial(true, err.into()));
        }

        info!(
            sale_id = %sale.id,
            product_id = %request.product_id,
            quantity = request.quantity,
            status = next.as_str(),
            "Return recorded"
        );

        let mut updated = sale;
        updated.status = next;
        Ok(SaleReceipt::new(&updated, items.len()))
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Finds a sale by invoice number (retry detection).
    pub async fn find_sale_by_invoice(&self, invoice_number: i64) -> ServiceResult<Option<Sale>> {
        Ok(self.db.sales().get_by_invoice_number(invoice_number).await?)
    }

    pub async fn get_sale(&self, sale_id: &str) -> ServiceResult<RecordedSale> {
        let sale = self.load(sale_id).await?;
        let items = self.db.sales().get_items(sale_id).await?;
        Ok(RecordedSale { sale, items })
    }

    async fn load(&self, sale_id: &str) -> ServiceResult<Sale> {
        self.db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use grox_core::dto::{CreateSaleRequest, ReturnRequest, SaleItemRequest};
    use grox_core::{Actor, CoreError, LedgerEventType, PaymentMode, PermissionSet, SaleStatus};

    use crate::error::ServiceError;
    use crate::test_support::{cashier, file_grox, memory_grox, product};

    fn item(product_id: &str, quantity: i64) -> SaleItemRequest {
        SaleItemRequest {
            product_id: Some(product_id.to_string()),
            quantity: Some(quantity),
            price: None,
        }
    }

    fn request(items: Vec<SaleItemRequest>) -> CreateSaleRequest {
        CreateSaleRequest {
            items,
            payment_mode: PaymentMode::Cash,
            tax: None,
            discount: None,
            hold: false,
        }
    }

    #[tokio::test]
    async fn test_checkout_prices_allocates_and_deducts() {
        let grox = memory_grox().await;
        let bread = product(&grox, "BREAD-1", 150, 10).await;
        let milk = product(&grox, "MILK-1", 80, 5).await;

        let mut req = request(vec![item(&bread.id, 2), item(&milk.id, 3)]);
        req.items[1].price = Some(70);
        req.tax = Some(50);
        req.discount = Some(20);

        let recorded = grox.sales().create_sale(&cashier(), &req).await.unwrap();
        let sale = &recorded.sale;

        assert_eq!(sale.invoice_number, 1);
        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.subtotal_cents, 2 * 150 + 3 * 70);
        assert_eq!(sale.total_cents, 2 * 150 + 3 * 70 + 50 - 20);
        assert_eq!(sale.cashier.as_deref(), Some("amina"));
        assert_eq!(recorded.receipt().invoice_label, "INV-000001");

        let db = grox.database();
        assert_eq!(db.stock().get(&bread.id).await.unwrap().unwrap().quantity, 8);
        assert_eq!(db.stock().get(&milk.id).await.unwrap().unwrap().quantity, 2);
        assert_eq!(db.products().get_by_id(&milk.id).await.unwrap().unwrap().sold_quantity, 3);

        let entries = db.ledger().list_for_product(&bread.id, None).await.unwrap();
        let sale_entry = entries.last().unwrap();
        assert_eq!(sale_entry.entry.quantity_delta, -2);
        assert_eq!(sale_entry.entry.resulting_balance, 8);
        assert_eq!(sale_entry.entry.reference_number.as_deref(), Some("INV-000001"));

        let next = grox.sales().create_sale(&cashier(), &request(vec![item(&bread.id, 1)])).await.unwrap();
        assert_eq!(next.sale.invoice_number, 2);
    }

    #[tokio::test]
    async fn test_validation_fails_before_any_write() {
        let grox = memory_grox().await;
        let bread = product(&grox, "BREAD-1", 150, 10).await;
        let sales = grox.sales();

        let err = sales.create_sale(&cashier(), &request(vec![])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::EmptyCart)));

        let err = sales
            .create_sale(&cashier(), &request(vec![item(&bread.id, 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::InvalidItem { line: 0, .. })));

        let err = sales
            .create_sale(&cashier(), &request(vec![item(&bread.id, 1), item("ghost", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::ProductNotFound(id)) if id == "ghost"));

        let mut too_much_discount = request(vec![item(&bread.id, 1)]);
        too_much_discount.discount = Some(1_000);
        let err = sales.create_sale(&cashier(), &too_much_discount).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(_)));

        let db = grox.database();
        assert_eq!(db.sequences().current("sales.invoice").await.unwrap(), None);
        assert_eq!(db.stock().get(&bread.id).await.unwrap().unwrap().quantity, 10);
    }

    #[tokio::test]
    async fn test_inactive_product_counts_as_not_found() {
        let grox = memory_grox().await;
        let old = product(&grox, "OLD-1", 100, 10).await;
        grox.database().products().soft_delete(&old.id).await.unwrap();

        let err = grox
            .sales()
            .create_sale(&cashier(), &request(vec![item(&old.id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_cashier_without_capability_is_forbidden() {
        let grox = memory_grox().await;
        let bread = product(&grox, "BREAD-1", 150, 10).await;
        let viewer = Actor::new("guest", PermissionSet::new(["ledger:read"]));

        let err = grox
            .sales()
            .create_sale(&viewer, &request(vec![item(&bread.id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_oversell_floors_stock_at_zero() {
        let grox = memory_grox().await;
        let bread = product(&grox, "BREAD-1", 150, 3).await;

        grox.sales()
            .create_sale(&cashier(), &request(vec![item(&bread.id, 5)]))
            .await
            .unwrap();

        let stock = grox.database().stock().get(&bread.id).await.unwrap().unwrap();
        assert_eq!(stock.quantity, 0);
    }

    #[tokio::test]
    async fn test_taken_invoice_number_is_duplicate_invoice() {
        let grox = memory_grox().await;
        let bread = product(&grox, "BREAD-1", 150, 10).await;

        // A sale numbered 1 exists without the counter knowing about it.
        let first = grox
            .sales()
            .create_sale(&cashier(), &request(vec![item(&bread.id, 1)]))
            .await
            .unwrap();
        sqlx::query("DELETE FROM invoice_sequences")
            .execute(grox.database().pool())
            .await
            .unwrap();

        let err = grox
            .sales()
            .create_sale(&cashier(), &request(vec![item(&bread.id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateInvoice(1)));

        let found = grox.sales().find_sale_by_invoice(1).await.unwrap().unwrap();
        assert_eq!(found.id, first.sale.id);
        assert_eq!(grox.database().stock().get(&bread.id).await.unwrap().unwrap().quantity, 9);
    }

    #[tokio::test]
    async fn test_failure_after_sale_write_is_partial_sale() {
        let grox = memory_grox().await;
        let bread = product(&grox, "BREAD-1", 150, 10).await;
        let ghost_stock = product(&grox, "GHOST-1", 100, 10).await;
        sqlx::query("DELETE FROM stock_levels WHERE product_id = ?1")
            .bind(&ghost_stock.id)
            .execute(grox.database().pool())
            .await
            .unwrap();

        let err = grox
            .sales()
            .create_sale(&cashier(), &request(vec![item(&bread.id, 2), item(&ghost_stock.id, 1)]))
            .await
            .unwrap_err();

        match err {
            ServiceError::PartialSale {
                invoice_number,
                completed_lines,
                total_lines,
                sale_id,
                ..
            } => {
                assert_eq!(invoice_number, 1);
                assert_eq!(completed_lines, 1);
                assert_eq!(total_lines, 2);
                let stored = grox.sales().get_sale(&sale_id).await.unwrap();
                assert_eq!(stored.items.len(), 2);
            }
            other => panic!("expected PartialSale, got {other:?}"),
        }

        assert_eq!(grox.database().stock().get(&bread.id).await.unwrap().unwrap().quantity, 8);
    }

    #[tokio::test]
    async fn test_closed_store_is_storage_unavailable() {
        let grox = memory_grox().await;
        let bread = product(&grox, "BREAD-1", 150, 10).await;
        grox.database().close().await;

        let err = grox
            .sales()
            .create_sale(&cashier(), &request(vec![item(&bread.id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_held_sale_moves_stock_only_when_completed() {
        let grox = memory_grox().await;
        let bread = product(&grox, "BREAD-1", 150, 10).await;
        let owner = Actor::system();

        let mut req = request(vec![item(&bread.id, 4)]);
        req.hold = true;
        let held = grox.sales().create_sale(&cashier(), &req).await.unwrap();
        assert_eq!(held.sale.status, SaleStatus::Pending);
        assert_eq!(grox.database().stock().get(&bread.id).await.unwrap().unwrap().quantity, 10);

        assert_eq!(held.sale.completed_at, None);

        let completed = grox.sales().complete_pending(&owner, &held.sale.id).await.unwrap();
        assert_eq!(completed.sale.status, SaleStatus::Completed);
        assert_eq!(grox.database().stock().get(&bread.id).await.unwrap().unwrap().quantity, 6);

        // the sale entry is dated at completion, not at creation
        let completed_at = completed.sale.completed_at.unwrap();
        assert!(completed_at > held.sale.created_at);
        let entries = grox.database().ledger().list_for_product(&bread.id, None).await.unwrap();
        let sale_entry = entries
            .iter()
            .find(|s| s.entry.event_type == LedgerEventType::Sale)
            .unwrap();
        assert_eq!(sale_entry.entry.occurred_at, completed_at);

        let err = grox.sales().cancel(&owner, &held.sale.id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InvalidStatusTransition {
                from: SaleStatus::Completed,
                to: SaleStatus::Cancelled
            })
        ));
    }

    #[tokio::test]
    async fn test_cancel_held_sale() {
        let grox = memory_grox().await;
        let bread = product(&grox, "BREAD-1", 150, 10).await;

        let mut req = request(vec![item(&bread.id, 4)]);
        req.hold = true;
        let held = grox.sales().create_sale(&cashier(), &req).await.unwrap();

        let cancelled = grox.sales().cancel(&Actor::system(), &held.sale.id).await.unwrap();
        assert_eq!(cancelled.status, SaleStatus::Cancelled);
        assert_eq!(grox.database().stock().get(&bread.id).await.unwrap().unwrap().quantity, 10);

        let err = grox.sales().complete_pending(&Actor::system(), &held.sale.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::InvalidStatusTransition { .. })));
    }

    #[tokio::test]
    async fn test_returns_advance_status_and_restock() {
        let grox = memory_grox().await;
        let bread = product(&grox, "BREAD-1", 150, 10).await;
        let owner = Actor::system();

        let sale = grox
            .sales()
            .create_sale(&cashier(), &request(vec![item(&bread.id, 3)]))
            .await
            .unwrap();

        let ret = |quantity| ReturnRequest {
            sale_id: sale.sale.id.clone(),
            product_id: bread.id.clone(),
            quantity,
            note: Some("damaged packaging".to_string()),
        };

        let receipt = grox.sales().record_return(&owner, &ret(1)).await.unwrap();
        assert_eq!(receipt.status, SaleStatus::PartiallyReturned);
        assert_eq!(grox.database().stock().get(&bread.id).await.unwrap().unwrap().quantity, 8);

        let err = grox.sales().record_return(&owner, &ret(3)).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::ReturnExceedsSold { requested: 3, returnable: 2, .. })
        ));

        let receipt = grox.sales().record_return(&owner, &ret(2)).await.unwrap();
        assert_eq!(receipt.status, SaleStatus::FullyRefunded);
        assert_eq!(grox.database().stock().get(&bread.id).await.unwrap().unwrap().quantity, 10);

        let items = grox.sales().get_sale(&sale.sale.id).await.unwrap().items;
        assert_eq!(items[0].quantity, 3);

        let err = grox.sales().record_return(&owner, &ret(1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::ReturnExceedsSold { .. })));
    }

    #[tokio::test]
    async fn test_return_missing_from_ledger_is_partial_return() {
        let grox = memory_grox().await;
        let bread = product(&grox, "BREAD-1", 150, 10).await;
        let owner = Actor::system();

        let sale = grox
            .sales()
            .create_sale(&cashier(), &request(vec![item(&bread.id, 3)]))
            .await
            .unwrap();

        sqlx::query(
            r#"
            CREATE TRIGGER block_returns BEFORE INSERT ON ledger_entries
            WHEN NEW.event_type = 'return'
            BEGIN
                SELECT RAISE(ABORT, 'ledger closed');
            END
            "#,
        )
        .execute(grox.database().pool())
        .await
        .unwrap();

        let err = grox
            .sales()
            .record_return(
                &owner,
                &ReturnRequest {
                    sale_id: sale.sale.id.clone(),
                    product_id: bread.id.clone(),
                    quantity: 2,
                    note: None,
                },
            )
            .await
            .unwrap_err();

        match err {
            ServiceError::PartialReturn {
                sale_id,
                product_id,
                quantity,
                restocked,
                reason,
            } => {
                assert_eq!(sale_id, sale.sale.id);
                assert_eq!(product_id, bread.id);
                assert_eq!(quantity, 2);
                assert!(restocked);
                assert!(reason.contains("ledger closed"));
            }
            other => panic!("expected PartialReturn, got {other:?}"),
        }

        assert_eq!(grox.database().stock().get(&bread.id).await.unwrap().unwrap().quantity, 9);
        let stored = grox.sales().get_sale(&sale.sale.id).await.unwrap();
        assert_eq!(stored.sale.status, SaleStatus::PartiallyReturned);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_get_distinct_invoices() {
        let grox = file_grox().await;
        let bread = product(&grox, "BREAD-1", 150, 1).await;
        let n = 20;

        let handles: Vec<_> = (0..n)
            .map(|_| {
                let sales = grox.sales();
                let req = request(vec![item(&bread.id, 1)]);
                tokio::spawn(async move { sales.create_sale(&cashier(), &req).await.unwrap() })
            })
            .collect();

        let mut invoices = HashSet::new();
        for handle in handles {
            invoices.insert(handle.await.unwrap().sale.invoice_number);
        }

        assert_eq!(invoices.len(), n);
        assert_eq!(grox.database().stock().get(&bread.id).await.unwrap().unwrap().quantity, 0);
        assert_eq!(
            grox.database().products().get_by_id(&bread.id).await.unwrap().unwrap().sold_quantity,
            n as i64
        );
    }
}
