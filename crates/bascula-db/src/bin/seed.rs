//! # Seed Data Generator
//!
//! Populates a database with a demo catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./bascula_dev.db
//! cargo run -p bascula-db --bin seed
//!
//! # Specify database path
//! cargo run -p bascula-db --bin seed -- --db ./data/bascula.db
//! ```
//!
//! ## Generated Data
//! - Container tares (crates, boxes, sacks, trays)
//! - Produce sold by the kilogram, each with P1..P3 prices, a purchase
//!   cost and opening stock
//! - A few clients spread over the price tiers

use bascula_core::pricing::PriceTierSet;
use bascula_core::{Kilograms, Money, PriceTier};
use bascula_db::{Database, DbConfig, NewClient, NewProduct};
use rust_decimal::{Decimal, RoundingStrategy};
use std::env;

/// (name, empty weight in grams)
const TARES: &[(&str, i64)] = &[
    ("Caja plástica", 1800),
    ("Reja madera", 2400),
    ("Arpilla", 150),
    ("Charola unicel", 35),
    ("Costal", 250),
];

/// (sku, name, P1 per kg in cents, opening stock in kg)
const PRODUCTS: &[(&str, &str, i64, i64)] = &[
    ("JIT-SAL", "Jitomate saladette", 2490, 400),
    ("TOM-VER", "Tomate verde", 2890, 150),
    ("PAP-BLA", "Papa blanca", 2290, 600),
    ("CEB-BLA", "Cebolla blanca", 2150, 350),
    ("CHI-SER", "Chile serrano", 4500, 80),
    ("CHI-JAL", "Chile jalapeño", 3800, 120),
    ("AGU-HAS", "Aguacate hass", 6900, 200),
    ("LIM-SEM", "Limón sin semilla", 3200, 300),
    ("NAR-VAL", "Naranja valencia", 1490, 500),
    ("PLA-TAB", "Plátano tabasco", 1890, 450),
    ("ZAN-ZAN", "Zanahoria", 1390, 250),
    ("CAL-ITA", "Calabaza italiana", 2590, 90),
];

/// P2 and P3 as a share of P1.
const TIER_DISCOUNTS: &[(u8, i64)] = &[(2, 95), (3, 90)];

/// (name, default tier, credit limit in pesos)
const CLIENTS: &[(&str, u8, Option<i64>)] = &[
    ("Público en general", 1, None),
    ("Fonda La Güera", 2, Some(3000)),
    ("Abarrotes Don Memo", 2, Some(8000)),
    ("Restaurante El Mirador", 3, Some(15000)),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bascula_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Báscula Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bascula_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Báscula Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (name, grams) in TARES {
        db.tares().create(name, Kilograms::new(Decimal::new(*grams, 3))).await?;
    }
    println!("✓ {} tares", TARES.len());

    for (sku, name, p1_cents, stock) in PRODUCTS {
        let product = demo_product(sku, name, *p1_cents, *stock)?;
        if let Err(e) = db.products().insert(product).await {
            eprintln!("Failed to insert {}: {}", sku, e);
        }
    }
    println!("✓ {} products", db.products().count().await?);

    for (name, tier, limit) in CLIENTS {
        db.clients()
            .insert(NewClient {
                name: name.to_string(),
                default_tier: PriceTier::new(*tier)?,
                credit_limit: limit.map(|l| Money::new(Decimal::from(l))),
            })
            .await?;
    }
    println!("✓ {} clients", CLIENTS.len());

    println!();
    println!("✓ Seed complete!");
    db.close().await;

    Ok(())
}

/// A product with tiered prices and a cost at 65% of P1.
fn demo_product(sku: &str, name: &str, p1_cents: i64, stock_kg: i64) -> Result<NewProduct, Box<dyn std::error::Error>> {
    let p1 = Decimal::new(p1_cents, 2);
    let share = |pct: i64| {
        (p1 * Decimal::from(pct) / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    };

    let mut prices = PriceTierSet::new(Money::new(p1))?;
    for (tier, pct) in TIER_DISCOUNTS {
        prices.set(PriceTier::new(*tier)?, Money::new(share(*pct)))?;
    }

    Ok(NewProduct {
        sku: sku.to_string(),
        name: name.to_string(),
        cost_per_kg: Some(Money::new(share(65))),
        initial_stock: Kilograms::new(Decimal::from(stock_kg)),
        prices,
    })
}
