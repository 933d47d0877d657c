//! # Ledger Service
//!
//! Per-product stock history, rebuilt from stored events on every request.
//!
//! ```text
//! get_ledger("Sugar 1kg", supplier?)
//!     │
//!     ├─► products().get_by_name()          ── ProductNotFound if absent
//!     ├─► ledger().list_for_product()       ── supplier filter applies here
//!     ├─► sales().sold_lines_for_product()  ── completed / returned sales
//!     │
//!     ▼
//! ledger::reconstruct(events, policy) ──► LedgerResponse
//!     │
//!     └─► floored replay compared against stock().get(); drift is logged,
//!         not corrected
//! ```

use tracing::{debug, warn};

use grox_core::dto::LedgerResponse;
use grox_core::ledger::{reconstruct, BalancePolicy, LedgerEvent};
use grox_core::{Actor, Capability, CoreError};
use grox_db::Database;

use crate::error::ServiceResult;

#[derive(Debug, Clone)]
pub struct LedgerService {
    db: Database,
    policy: BalancePolicy,
}

impl LedgerService {
    pub fn new(db: Database, policy: BalancePolicy) -> Self {
        LedgerService { db, policy }
    }

    pub fn policy(&self) -> BalancePolicy {
        self.policy
    }

    /// Replays the history of the product named `product_name`.
    ///
    /// `supplier_id` narrows the ledger entries to that supplier's; sale
    /// lines carry no supplier and are always included.
    pub async fn get_ledger(
        &self,
        actor: &Actor,
        product_name: &str,
        supplier_id: Option<&str>,
    ) -> ServiceResult<LedgerResponse> {
        actor.require(Capability::ViewLedger)?;

        let name = product_name.trim();
        let product = self
            .db
            .products()
            .get_by_name(name)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(name.to_string()))?;

        let entries = self.db.ledger().list_for_product(&product.id, supplier_id).await?;
        let sold = self.db.sales().sold_lines_for_product(&product.id).await?;

        let events: Vec<LedgerEvent> = entries
            .iter()
            .filter_map(|stored| {
                LedgerEvent::from_entry(&stored.entry, stored.seq, stored.supplier_name.clone())
            })
            .chain(sold.iter().filter_map(LedgerEvent::from_sold_line))
            .collect();

        debug!(
            product_id = %product.id,
            entries = entries.len(),
            sale_lines = sold.len(),
            policy = %self.policy,
            "Replaying ledger"
        );

        let replay = reconstruct(events, self.policy);
        let cached_stock = self.db.stock().get(&product.id).await?.map(|level| level.quantity);

        // A supplier-filtered replay is a partial history, so only the full
        // one is comparable with the cache.
        if supplier_id.is_none() && cached_stock != Some(replay.floored_stock) {
            warn!(
                product_id = %product.id,
                replayed = replay.floored_stock,
                cached = ?cached_stock,
                "Cached stock differs from ledger replay"
            );
        }

        Ok(LedgerResponse {
            product: product.name,
            current_stock: replay.current_stock,
            cached_stock,
            ledger: replay.rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use grox_core::dto::{
        CreateSaleRequest, Direction, NewSupplierRequest, SaleItemRequest, StockInRequest,
    };
    use grox_core::ledger::BalancePolicy;
    use grox_core::{Actor, CoreError, LedgerEventType, PaymentMode, PermissionSet, Product};

    use super::LedgerService;
    use crate::error::ServiceError;
    use crate::test_support::{cashier, memory_grox, product};
    use crate::Grox;

    fn stock_in(product_id: &str, supplier_id: Option<&str>, quantity: i64) -> StockInRequest {
        StockInRequest {
            product_id: product_id.to_string(),
            supplier_id: supplier_id.map(str::to_string),
            quantity,
            cost_price: None,
            reference_number: None,
            note: None,
            received_at: None,
        }
    }

    async fn sell(grox: &Grox, product: &Product, quantity: i64) {
        grox.sales()
            .create_sale(
                &cashier(),
                &CreateSaleRequest {
                    items: vec![SaleItemRequest {
                        product_id: Some(product.id.clone()),
                        quantity: Some(quantity),
                        price: None,
                    }],
                    payment_mode: PaymentMode::Cash,
                    tax: None,
                    discount: None,
                    hold: false,
                },
            )
            .await
            .unwrap();
    }

    /// Opening 10, +20 received, then sales of 5 and 30.
    async fn oversold(grox: &Grox) -> Product {
        let sugar = product(grox, "SUGAR-1", 150, 10).await;
        grox.inventory()
            .stock_in(&Actor::system(), &stock_in(&sugar.id, None, 20))
            .await
            .unwrap();
        sell(grox, &sugar, 5).await;
        sell(grox, &sugar, 30).await;
        sugar
    }

    #[tokio::test]
    async fn test_oversold_history_shows_shortfall() {
        let grox = memory_grox().await;
        let sugar = oversold(&grox).await;

        let response = grox.ledger().get_ledger(&cashier(), &sugar.name, None).await.unwrap();

        let balances: Vec<i64> = response.ledger.iter().map(|row| row.balance).collect();
        assert_eq!(balances, vec![10, 30, 25, -5]);
        assert_eq!(response.current_stock, -5);
        assert_eq!(response.cached_stock, Some(0));
        assert_eq!(response.product, sugar.name);

        let last = response.ledger.last().unwrap();
        assert_eq!(last.direction, Direction::Out);
        assert_eq!(last.quantity_out, 30);
        assert_eq!(last.reference_number.as_deref(), Some("INV-000002"));
        assert_eq!(last.cashier.as_deref(), Some("amina"));
    }

    #[tokio::test]
    async fn test_oversold_history_clamped() {
        let grox = memory_grox().await;
        let sugar = oversold(&grox).await;

        let clamped = LedgerService::new(grox.database().clone(), BalancePolicy::Clamp);
        let response = clamped.get_ledger(&cashier(), &sugar.name, None).await.unwrap();

        let balances: Vec<i64> = response.ledger.iter().map(|row| row.balance).collect();
        assert_eq!(balances, vec![10, 30, 25, 0]);
        assert_eq!(response.current_stock, 0);
        assert_eq!(response.cached_stock, Some(0));
    }

    #[tokio::test]
    async fn test_replay_is_idempotent_and_ignores_cache() {
        let grox = memory_grox().await;
        let sugar = oversold(&grox).await;
        let ledger = grox.ledger();

        let first = ledger.get_ledger(&cashier(), &sugar.name, None).await.unwrap();

        sqlx::query("UPDATE stock_levels SET quantity = 99 WHERE product_id = ?1")
            .bind(&sugar.id)
            .execute(grox.database().pool())
            .await
            .unwrap();

        let second = ledger.get_ledger(&cashier(), &sugar.name, None).await.unwrap();
        assert_eq!(second.ledger, first.ledger);
        assert_eq!(second.current_stock, first.current_stock);
        assert_eq!(second.cached_stock, Some(99));
    }

    #[tokio::test]
    async fn test_sale_counted_once() {
        let grox = memory_grox().await;
        let rice = product(&grox, "RICE-5", 700, 8).await;
        sell(&grox, &rice, 3).await;

        // the sale wrote both a sale line and a sale ledger entry
        let stored = grox.database().ledger().list_for_product(&rice.id, None).await.unwrap();
        assert!(stored.iter().any(|s| s.entry.event_type == LedgerEventType::Sale));

        let response = grox.ledger().get_ledger(&cashier(), &rice.name, None).await.unwrap();
        assert_eq!(response.ledger.len(), 2);
        assert_eq!(response.current_stock, 5);
        assert_eq!(response.cached_stock, Some(5));
    }

    #[tokio::test]
    async fn test_held_sale_not_in_history() {
        let grox = memory_grox().await;
        let oil = product(&grox, "OIL-1L", 300, 6).await;

        grox.sales()
            .create_sale(
                &cashier(),
                &CreateSaleRequest {
                    items: vec![SaleItemRequest {
                        product_id: Some(oil.id.clone()),
                        quantity: Some(2),
                        price: None,
                    }],
                    payment_mode: PaymentMode::Card,
                    tax: None,
                    discount: None,
                    hold: true,
                },
            )
            .await
            .unwrap();

        let response = grox.ledger().get_ledger(&cashier(), &oil.name, None).await.unwrap();
        assert_eq!(response.ledger.len(), 1);
        assert_eq!(response.current_stock, 6);
    }

    #[tokio::test]
    async fn test_completed_held_sale_replays_at_completion() {
        let grox = memory_grox().await;
        let owner = Actor::system();
        let flour = product(&grox, "FLOUR-2", 180, 0).await;

        let held = grox
            .sales()
            .create_sale(
                &cashier(),
                &CreateSaleRequest {
                    items: vec![SaleItemRequest {
                        product_id: Some(flour.id.clone()),
                        quantity: Some(5),
                        price: None,
                    }],
                    payment_mode: PaymentMode::Cash,
                    tax: None,
                    discount: None,
                    hold: true,
                },
            )
            .await
            .unwrap();
        grox.inventory().stock_in(&owner, &stock_in(&flour.id, None, 10)).await.unwrap();
        grox.sales().complete_pending(&owner, &held.sale.id).await.unwrap();

        let clamped = LedgerService::new(grox.database().clone(), BalancePolicy::Clamp);
        let response = clamped.get_ledger(&cashier(), &flour.name, None).await.unwrap();

        let balances: Vec<i64> = response.ledger.iter().map(|row| row.balance).collect();
        assert_eq!(balances, vec![10, 5]);
        assert_eq!(response.ledger[1].direction, Direction::Out);
        assert_eq!(response.current_stock, 5);
        assert_eq!(response.cached_stock, Some(5));
    }

    #[tokio::test]
    async fn test_supplier_filter() {
        let grox = memory_grox().await;
        let owner = Actor::system();
        let salt = product(&grox, "SALT-1", 60, 0).await;

        let mut ids = Vec::new();
        for name in ["Kensalt", "Malindi Salt"] {
            let supplier = grox
                .inventory()
                .create_supplier(
                    &owner,
                    &NewSupplierRequest {
                        name: name.to_string(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            ids.push(supplier.id);
        }

        grox.inventory().stock_in(&owner, &stock_in(&salt.id, Some(&ids[0]), 12)).await.unwrap();
        grox.inventory().stock_in(&owner, &stock_in(&salt.id, Some(&ids[1]), 7)).await.unwrap();
        sell(&grox, &salt, 4).await;

        let all = grox.ledger().get_ledger(&cashier(), &salt.name, None).await.unwrap();
        assert_eq!(all.current_stock, 15);

        let filtered = grox
            .ledger()
            .get_ledger(&cashier(), &salt.name, Some(&ids[1]))
            .await
            .unwrap();
        assert_eq!(filtered.ledger.len(), 2);
        assert_eq!(filtered.ledger[0].supplier_name.as_deref(), Some("Malindi Salt"));
        assert_eq!(filtered.current_stock, 3);
    }

    #[tokio::test]
    async fn test_unknown_product_and_missing_capability() {
        let grox = memory_grox().await;
        let tea = product(&grox, "TEA-1", 250, 3).await;

        let err = grox.ledger().get_ledger(&cashier(), "Nothing", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::ProductNotFound(name)) if name == "Nothing"));

        let clerk = Actor::new("otieno", PermissionSet::new(["sales:create"]));
        let err = grox.ledger().get_ledger(&clerk, &tea.name, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_product_without_history() {
        let grox = memory_grox().await;
        let empty = product(&grox, "NEW-1", 100, 0).await;

        let response = grox.ledger().get_ledger(&cashier(), &empty.name, None).await.unwrap();
        assert!(response.ledger.is_empty());
        assert_eq!(response.current_stock, 0);
        assert_eq!(response.cached_stock, Some(0));
    }
}
