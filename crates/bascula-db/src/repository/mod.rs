//! # Repository Module
//!
//! Database repository implementations for Báscula.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Command                                                                │
//! │       │  db.orders().commit(&draft, "caja1")                            │
//! │       ▼                                                                 │
//! │  OrderRepository                                                        │
//! │       │  BEGIN                                                          │
//! │       │  re-read stock ─► bascula_core::inventory::apply_movement       │
//! │       │  INSERT orders / order_lines / stock_movements                  │
//! │       │  UPDATE products.current_stock                                  │
//! │       │  COMMIT                                                         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Queries are runtime-checked (`sqlx::query_as` + `FromRow` row structs).
//! Row structs hold decimal columns as `String` and convert into domain
//! types with `TryFrom`, so a corrupt value surfaces as
//! [`DbError::InvalidData`] instead of a panic.
//!
//! ## Available Repositories
//!
//! - [`tare::TareRepository`] - Tare catalog
//! - [`product::ProductRepository`] - Products and price tiers
//! - [`client::ClientRepository`] - Clients and default tiers
//! - [`order::OrderRepository`] - Order commit and history
//! - [`movement::MovementRepository`] - Gated stock movements
//! - [`report::ReportRepository`] - Margin report

pub mod client;
pub mod movement;
pub mod order;
pub mod product;
pub mod report;
pub mod tare;

use bascula_core::{Kilograms, Money, PriceTier};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// New UUID v4 for a row id.
pub(crate) fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn decimal_column(field: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| DbError::invalid_data(field, e))
}

pub(crate) fn kilograms_column(field: &str, raw: &str) -> DbResult<Kilograms> {
    decimal_column(field, raw).map(Kilograms::new)
}

pub(crate) fn money_column(field: &str, raw: &str) -> DbResult<Money> {
    decimal_column(field, raw).map(Money::new)
}

pub(crate) fn optional_money_column(field: &str, raw: Option<&str>) -> DbResult<Option<Money>> {
    raw.map(|r| money_column(field, r)).transpose()
}

pub(crate) fn tier_column(field: &str, raw: i64) -> DbResult<PriceTier> {
    u8::try_from(raw)
        .map_err(|e| DbError::invalid_data(field, e))
        .and_then(|i| PriceTier::new(i).map_err(|e| DbError::invalid_data(field, e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the repository tests.

    use bascula_core::pricing::{PriceTierSet, TierPrice};
    use bascula_core::{Kilograms, Money, PriceTier, Product, TareSpec};
    use rust_decimal::Decimal;

    use crate::repository::product::NewProduct;
    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// A product priced at `p1` (tier 1) and `p1 - 2` (tier 2).
    pub async fn product_with_stock(db: &Database, sku: &str, p1: Decimal, stock: Decimal) -> Product {
        let prices = PriceTierSet::from_entries(vec![
            TierPrice { tier: PriceTier::BASE, price: Money::new(p1) },
            TierPrice {
                tier: PriceTier::new(2).unwrap(),
                price: Money::new(p1 - Decimal::TWO),
            },
        ])
        .unwrap();

        db.products()
            .insert(NewProduct {
                sku: sku.to_string(),
                name: format!("Producto {}", sku),
                cost_per_kg: Some(Money::new(p1 / Decimal::TWO)),
                initial_stock: Kilograms::new(stock),
                prices,
            })
            .await
            .unwrap()
    }

    pub async fn piece_sale(db: &Database) -> TareSpec {
        db.tares().piece_sale().await.unwrap()
    }
}
