//! # Seed Data Generator
//!
//! Populates the database with demo products for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database (./souk.db)
//! cargo run -p souk-db --bin seed
//!
//! # Specify database path
//! cargo run -p souk-db --bin seed -- --db ./data/souk.db
//! ```
//!
//! ## Generated Products
//! A small marketplace catalog spread across a handful of seller accounts:
//! rugs, lamps, ceramics, spices. Prices are 2-digit decimals; stock levels
//! include a few low-stock and sold-out rows so cart sanitation and
//! checkout rejection paths can be exercised by hand.

use std::env;

use souk_db::{Database, DbConfig, NewProduct};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// (seller, name, price, stock, active)
const PRODUCTS: &[(i64, &str, &str, i64, bool)] = &[
    (101, "Handwoven Berber Rug", "249.00", 4, true),
    (101, "Kilim Runner 2x6", "129.50", 7, true),
    (101, "Vintage Tribal Rug", "410.00", 1, true),
    (102, "Brass Moroccan Lamp", "89.99", 12, true),
    (102, "Punched-Tin Lantern", "45.00", 0, true),
    (102, "Stained Glass Pendant", "132.25", 3, true),
    (103, "Ceramic Tagine Pot", "64.00", 9, true),
    (103, "Hand-Painted Serving Bowl", "38.75", 15, true),
    (103, "Zellige Tile Coaster Set", "24.99", 30, true),
    (104, "Saffron Threads 2g", "18.50", 40, true),
    (104, "Ras el Hanout Blend", "9.95", 60, true),
    (104, "Preserved Lemons Jar", "12.00", 0, true),
    (104, "Harissa Paste", "7.25", 25, true),
    (105, "Leather Pouf Ottoman", "119.00", 5, true),
    (105, "Discontinued Floor Cushion", "55.00", 8, false),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./souk.db".to_string());

    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let products = db.products();

    for (owner_id, name, price, stock, is_active) in PRODUCTS {
        let product = products
            .insert(&NewProduct {
                owner_id: *owner_id,
                name: (*name).to_string(),
                price: price.parse()?,
                stock: *stock,
                is_active: *is_active,
            })
            .await?;
        info!(id = product.id, name = %product.name, stock = product.stock, "Seeded product");
    }

    let count = products.count().await?;
    info!(count, "Seeding complete");

    db.close().await;
    Ok(())
}

/// Parses `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}
