//! # Product Repository
//!
//! Products sold by weight, with their P1..P5 price tiers.
//!
//! ```text
//! products                         product_prices
//! ┌──────────────┐                 ┌────────────┬──────┬──────────────┐
//! │ id           │◄────────────────│ product_id │ tier │ price_per_kg │
//! │ sku (UNIQUE) │  ON DELETE      ├────────────┼──────┼──────────────┤
//! │ current_stock│  CASCADE        │ ...        │  1   │ 32.50        │
//! │ cost_per_kg  │                 │ ...        │  3   │ 29.00        │
//! └──────────────┘                 └────────────┴──────┴──────────────┘
//! ```
//!
//! `current_stock` is never written directly from here after creation:
//! every change goes through [`MovementRepository`](super::movement::MovementRepository)
//! or an order commit so the movement ledger stays complete.

use bascula_core::inventory::{apply_movement, MovementKind};
use bascula_core::pricing::{PriceTierSet, TierPrice};
use bascula_core::validation::{validate_price, validate_product_name, validate_sku};
use bascula_core::{Kilograms, Money, PriceTier, Product, StockMovement};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::movement::insert_movement;
use crate::repository::{generate_id, kilograms_column, money_column, optional_money_column, tier_column};

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    sku: String,
    name: String,
    cost_per_kg: Option<String>,
    current_stock: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct PriceRow {
    product_id: String,
    tier: i64,
    price_per_kg: String,
}

impl PriceRow {
    fn into_tier_price(self) -> DbResult<(String, TierPrice)> {
        let entry = TierPrice {
            tier: tier_column("product_prices.tier", self.tier)?,
            price: money_column("product_prices.price_per_kg", &self.price_per_kg)?,
        };
        Ok((self.product_id, entry))
    }
}

impl ProductRow {
    fn into_product(self, prices: Vec<TierPrice>) -> DbResult<Product> {
        let prices = PriceTierSet::from_entries(prices)
            .map_err(|e| DbError::invalid_data(format!("prices of {}", self.sku), e))?;

        Ok(Product {
            cost_per_kg: optional_money_column("products.cost_per_kg", self.cost_per_kg.as_deref())?,
            current_stock: kilograms_column("products.current_stock", &self.current_stock)?,
            id: self.id,
            sku: self.sku,
            name: self.name,
            prices,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT id, sku, name, cost_per_kg, current_stock, is_active, created_at, updated_at
    FROM products
"#;

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub cost_per_kg: Option<Money>,
    /// Recorded as an `entrada` movement when positive.
    pub initial_stock: Kilograms,
    pub prices: PriceTierSet,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    async fn load_prices(conn: &mut SqliteConnection, product_id: &str) -> DbResult<Vec<TierPrice>> {
        let rows: Vec<PriceRow> = sqlx::query_as(
            "SELECT product_id, tier, price_per_kg FROM product_prices WHERE product_id = ?1 ORDER BY tier",
        )
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter()
            .map(|r| r.into_tier_price().map(|(_, p)| p))
            .collect()
    }

    pub(crate) async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_PRODUCT))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => {
                let prices = Self::load_prices(conn, &row.id).await?;
                Ok(Some(row.into_product(prices)?))
            }
            None => Ok(None),
        }
    }

    /// Active products sorted by name, with prices loaded in one extra query.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("{} WHERE is_active = 1 ORDER BY name", SELECT_PRODUCT))
                .fetch_all(&self.pool)
                .await?;

        let price_rows: Vec<PriceRow> = sqlx::query_as(
            r#"
            SELECT pp.product_id, pp.tier, pp.price_per_kg
            FROM product_prices pp
            JOIN products p ON p.id = pp.product_id
            WHERE p.is_active = 1
            ORDER BY pp.product_id, pp.tier
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut prices: HashMap<String, Vec<TierPrice>> = HashMap::new();
        for row in price_rows {
            let (product_id, entry) = row.into_tier_price()?;
            prices.entry(product_id).or_default().push(entry);
        }

        debug!(count = rows.len(), "Listed active products");

        rows.into_iter()
            .map(|row| {
                let entries = prices.remove(&row.id).unwrap_or_default();
                row.into_product(entries)
            })
            .collect()
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_by_id(&mut conn, id).await
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        let id: Option<String> = sqlx::query_scalar("SELECT id FROM products WHERE sku = ?1")
            .bind(sku.trim())
            .fetch_optional(&mut *conn)
            .await?;

        match id {
            Some(id) => Self::fetch_by_id(&mut conn, &id).await,
            None => Ok(None),
        }
    }

    /// Inserts a product and its prices in one transaction.
    ///
    /// ## Errors
    /// - `Validation` for a bad SKU, name, cost or negative stock
    /// - `UniqueViolation` when the SKU exists
    pub async fn insert(&self, new: NewProduct) -> DbResult<Product> {
        let sku = validate_sku(&new.sku)?;
        let name = validate_product_name(&new.name)?;
        if let Some(cost) = new.cost_per_kg {
            validate_price("cost per kg", cost)?;
        }

        let now = Utc::now();
        let id = generate_id();

        debug!(sku = %sku, "Inserting product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, cost_per_kg, current_stock, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, '0', 1, ?5, ?5)
            "#,
        )
        .bind(&id)
        .bind(&sku)
        .bind(&name)
        .bind(new.cost_per_kg.map(|c| c.amount().to_string()))
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value("sku", &sku))?;

        for entry in new.prices.entries() {
            write_price(&mut tx, &id, entry.tier, entry.price).await?;
        }

        let mut current_stock = Kilograms::zero();
        if !new.initial_stock.is_zero() {
            let change = apply_movement(&name, current_stock, MovementKind::Entrada, new.initial_stock)?;
            current_stock = change.resulting_stock;
            write_stock(&mut tx, &id, current_stock, now).await?;
            insert_movement(
                &mut tx,
                &StockMovement {
                    id: generate_id(),
                    product_id: id.clone(),
                    kind: MovementKind::Entrada,
                    delta: change.delta,
                    resulting_stock: change.resulting_stock,
                    reason: Some("initial stock".to_string()),
                    authorized_by: None,
                    order_id: None,
                    created_at: now,
                },
            )
            .await?;
        }

        tx.commit().await?;

        info!(id = %id, sku = %sku, stock = %current_stock, "Product created");

        Ok(Product {
            id,
            sku,
            name,
            cost_per_kg: new.cost_per_kg,
            current_stock,
            prices: new.prices,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Sets a tier price, or clears it with `None`. Tier 1 cannot be cleared.
    pub async fn set_price(&self, product_id: &str, tier: PriceTier, price: Option<Money>) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;

        let mut product = Self::fetch_by_id(&mut tx, product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        match price {
            Some(price) => {
                product.prices.set(tier, price)?;
                write_price(&mut tx, product_id, tier, price).await?;
            }
            None => {
                product.prices.clear(tier)?;
                sqlx::query("DELETE FROM product_prices WHERE product_id = ?1 AND tier = ?2")
                    .bind(product_id)
                    .bind(tier.index())
                    .execute(&mut *tx)
                    .await?;
            }
        }

        product.updated_at = Utc::now();
        sqlx::query("UPDATE products SET updated_at = ?2 WHERE id = ?1")
            .bind(product_id)
            .bind(product.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(product_id = %product_id, tier = %tier, price = ?price.map(|p| p.amount()), "Tier price updated");
        Ok(product)
    }

    /// Updates the purchase cost used by the margin report.
    pub async fn set_cost(&self, product_id: &str, cost_per_kg: Option<Money>) -> DbResult<()> {
        if let Some(cost) = cost_per_kg {
            validate_price("cost per kg", cost)?;
        }

        let result = sqlx::query("UPDATE products SET cost_per_kg = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(product_id)
            .bind(cost_per_kg.map(|c| c.amount().to_string()))
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }
        Ok(())
    }

    /// Hides a product from the catalog. Order history keeps referencing it.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn write_price(conn: &mut SqliteConnection, product_id: &str, tier: PriceTier, price: Money) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO product_prices (product_id, tier, price_per_kg) VALUES (?1, ?2, ?3)
        ON CONFLICT (product_id, tier) DO UPDATE SET price_per_kg = excluded.price_per_kg
        "#,
    )
    .bind(product_id)
    .bind(tier.index())
    .bind(price.amount().to_string())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Overwrites a product's stock. Callers compute the value with
/// `apply_movement` inside the same transaction.
pub(crate) async fn write_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    stock: Kilograms,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query("UPDATE products SET current_stock = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(product_id)
        .bind(stock.value().to_string())
        .bind(now)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", product_id));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
