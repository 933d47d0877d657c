//! # Seed Data Generator
//!
//! Fills a fresh database with a small shop: suppliers, products with
//! opening stock, a few deliveries and a day of sales.
//!
//! ## Usage
//! ```bash
//! # Uses GROX_DATABASE_PATH (default ./grox.db)
//! cargo run -p grox-service --bin seed
//!
//! # Specify database path
//! cargo run -p grox-service --bin seed -- --db ./data/shop.db
//!
//! # More logging
//! RUST_LOG=grox_service=debug,grox_db=debug cargo run -p grox-service --bin seed
//! ```

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use grox_core::dto::{
    CreateSaleRequest, NewProductRequest, NewSupplierRequest, SaleItemRequest, StockInRequest,
};
use grox_core::{Actor, PaymentMode};
use grox_service::{Grox, GroxConfig};

/// (name, sku, category, cost cents, markup bps, min quantity, opening stock)
const PRODUCTS: &[(&str, &str, &str, i64, u32, i64, i64)] = &[
    ("Sugar 1kg", "SUG-1KG", "Grocery", 13000, 1500, 10, 24),
    ("Maize Flour 2kg", "UNG-2KG", "Grocery", 16500, 1200, 10, 30),
    ("Rice 5kg", "RCE-5KG", "Grocery", 72000, 1800, 4, 8),
    ("Cooking Oil 1L", "OIL-1L", "Grocery", 28000, 2000, 6, 12),
    ("Fresh Milk 500ml", "MLK-500", "Dairy", 5000, 2500, 20, 40),
    ("Bread 400g", "BRD-400", "Bakery", 5500, 1800, 15, 30),
    ("Bar Soap 800g", "SOP-800", "Household", 17500, 2200, 5, 10),
    ("Tea Leaves 250g", "TEA-250", "Beverages", 14000, 3000, 5, 3),
];

const SUPPLIERS: &[&str] = &["Mumias Distributors", "Bidco Wholesale", "Brookside Depot"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("grox_service=info,grox_db=warn,seed=info")),
        )
        .init();

    let mut config = GroxConfig::load().context("invalid configuration")?;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Grox Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: GROX_DATABASE_PATH)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let grox = Grox::open(config).await.context("failed to open database")?;

    let existing = grox.database().products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products; skipping seed");
        return Ok(());
    }

    let owner = Actor::system();
    let inventory = grox.inventory();

    let mut supplier_ids = Vec::new();
    for name in SUPPLIERS {
        let supplier = inventory
            .create_supplier(
                &owner,
                &NewSupplierRequest {
                    name: name.to_string(),
                    ..Default::default()
                },
            )
            .await?;
        supplier_ids.push(supplier.id);
    }

    let mut products = Vec::new();
    for (name, sku, category, cost, markup_bps, min_quantity, opening_stock) in PRODUCTS {
        let product = inventory
            .create_product(
                &owner,
                &NewProductRequest {
                    name: name.to_string(),
                    sku: sku.to_string(),
                    category: Some(category.to_string()),
                    cost_price: *cost,
                    selling_price: None,
                    markup_bps: *markup_bps,
                    min_quantity: *min_quantity,
                    max_quantity: None,
                    expiry_date: None,
                    opening_stock: *opening_stock,
                },
            )
            .await
            .with_context(|| format!("failed to create {}", sku))?;
        products.push(product);
    }
    info!(count = products.len(), "Products created");

    for (idx, product) in products.iter().enumerate() {
        let supplier_id = &supplier_ids[idx % supplier_ids.len()];
        inventory
            .stock_in(
                &owner,
                &StockInRequest {
                    product_id: product.id.clone(),
                    supplier_id: Some(supplier_id.clone()),
                    quantity: 12,
                    cost_price: None,
                    reference_number: Some(format!("GRN-{:04}", idx + 1)),
                    note: None,
                    received_at: None,
                },
            )
            .await?;
    }
    info!("Deliveries received");

    let modes = [PaymentMode::Cash, PaymentMode::MobileMoney, PaymentMode::Card];
    for n in 0..10 {
        let items = products
            .iter()
            .skip(n % products.len())
            .take(3)
            .enumerate()
            .map(|(line, product)| SaleItemRequest {
                product_id: Some(product.id.clone()),
                quantity: Some((line as i64 % 3) + 1),
                price: None,
            })
            .collect();

        let recorded = grox
            .sales()
            .create_sale(
                &owner,
                &CreateSaleRequest {
                    items,
                    payment_mode: modes[n % modes.len()],
                    tax: None,
                    discount: None,
                    hold: false,
                },
            )
            .await?;
        info!(invoice = %recorded.receipt().invoice_label, total = recorded.sale.total_cents, "Sale recorded");
    }

    for product in &products {
        let ledger = grox.ledger().get_ledger(&owner, &product.name, None).await?;
        println!(
            "{:<20} events {:>3}  stock {:>4}",
            ledger.product,
            ledger.ledger.len(),
            ledger.current_stock
        );
    }

    let low = inventory.low_stock(&owner).await?;
    println!();
    println!("Low stock: {}", low.len());
    for row in low {
        println!("  {:<20} {:>4} (min {})", row.name, row.quantity, row.min_quantity);
    }

    info!("Seed complete");
    Ok(())
}
