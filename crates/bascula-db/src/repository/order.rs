//! # Order Repository
//!
//! Persists order drafts and reads order history.
//!
//! ## Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order Commit (one transaction)                       │
//! │                                                                         │
//! │  OrderDraft (validated at weigh time against stock then)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   ├── next folio  YYYYMMDD-NNNN                                        │
//! │   ├── INSERT orders (status = completed)                               │
//! │   ├── for each line:                                                    │
//! │   │     re-read stock → apply_movement(salida)  ✗ InsufficientStock    │
//! │   │     INSERT order_lines                                              │
//! │   │     INSERT stock_movements (order_id)                               │
//! │   └── UPDATE products.current_stock                                     │
//! │  COMMIT                        any error → ROLLBACK, nothing written    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is checked when a line is weighed and again here, so a movement
//! recorded between the two makes the commit fail instead of driving stock
//! negative.

use bascula_core::inventory::{apply_movement, MovementKind};
use bascula_core::{
    AuthorizationPolicy, Capability, CoreError, Kilograms, Order, OrderDraft, OrderLine, OrderStatus,
    Principal, StockMovement,
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::movement::{insert_movement, read_stock};
use crate::repository::product::write_stock;
use crate::repository::{generate_id, kilograms_column, money_column, tier_column};

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    folio: String,
    client_id: Option<String>,
    status: OrderStatus,
    price_tier: i64,
    subtotal: String,
    operator: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        Ok(Order {
            price_tier: tier_column("orders.price_tier", row.price_tier)?,
            subtotal: money_column("orders.subtotal", &row.subtotal)?,
            id: row.id,
            folio: row.folio,
            client_id: row.client_id,
            status: row.status,
            operator: row.operator,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrderLineRow {
    id: String,
    product_id: String,
    name_snapshot: String,
    tare_id: String,
    tare_name_snapshot: String,
    gross_weight: String,
    box_count: i64,
    quantity: String,
    unit_price: String,
    price_tier: i64,
    line_total: String,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = DbError;

    fn try_from(row: OrderLineRow) -> DbResult<Self> {
        Ok(OrderLine {
            gross_weight: kilograms_column("order_lines.gross_weight", &row.gross_weight)?,
            box_count: u32::try_from(row.box_count)
                .map_err(|e| DbError::invalid_data("order_lines.box_count", e))?,
            quantity: kilograms_column("order_lines.quantity", &row.quantity)?,
            unit_price: money_column("order_lines.unit_price", &row.unit_price)?,
            price_tier: tier_column("order_lines.price_tier", row.price_tier)?,
            line_total: money_column("order_lines.line_total", &row.line_total)?,
            id: row.id,
            product_id: row.product_id,
            name_snapshot: row.name_snapshot,
            tare_id: row.tare_id,
            tare_name_snapshot: row.tare_name_snapshot,
        })
    }
}

const SELECT_ORDER: &str = r#"
    SELECT id, folio, client_id, status, price_tier, subtotal, operator, created_at, completed_at
    FROM orders
"#;

/// A committed order with what it wrote.
#[derive(Debug, Clone)]
pub struct CommittedOrder {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    /// One movement per line (salida on commit, entrada on cancel).
    pub movements: Vec<StockMovement>,
}

impl CommittedOrder {
    /// Final stock per product after the commit, in first-seen order.
    pub fn stock_levels(&self) -> Vec<(String, Kilograms)> {
        let mut levels: Vec<(String, Kilograms)> = Vec::new();
        for m in &self.movements {
            match levels.iter_mut().find(|(id, _)| *id == m.product_id) {
                Some((_, stock)) => *stock = m.resulting_stock,
                None => levels.push((m.product_id.clone(), m.resulting_stock)),
            }
        }
        levels
    }
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists the draft as a completed order and discounts stock.
    ///
    /// ## Errors
    /// - `Domain(EmptyOrder)` for a draft with no lines
    /// - `Domain(InsufficientStock)` when stock fell since weighing
    /// - `NotFound` when a product was removed
    pub async fn commit(&self, draft: &OrderDraft, operator: &str) -> DbResult<CommittedOrder> {
        if draft.is_empty() {
            return Err(CoreError::EmptyOrder.into());
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let folio = next_folio(&mut tx, now).await?;
        let order = Order {
            id: generate_id(),
            folio,
            client_id: draft.client_id().map(str::to_string),
            status: OrderStatus::Completed,
            price_tier: draft.effective_tier(),
            subtotal: draft.subtotal(),
            operator: operator.to_string(),
            created_at: draft.created_at(),
            completed_at: Some(now),
        };

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, folio, client_id, status, price_tier, subtotal, operator, created_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&order.id)
        .bind(&order.folio)
        .bind(&order.client_id)
        .bind(order.status)
        .bind(order.price_tier.index())
        .bind(order.subtotal.amount().to_string())
        .bind(&order.operator)
        .bind(order.created_at)
        .bind(order.completed_at)
        .execute(&mut *tx)
        .await?;

        let reason = format!("venta {}", order.folio);
        let mut stock: HashMap<String, (String, Kilograms)> = HashMap::new();
        let mut movements = Vec::with_capacity(draft.line_count());

        for (line_no, line) in draft.lines().iter().enumerate() {
            if !stock.contains_key(&line.product_id) {
                let current = read_stock(&mut tx, &line.product_id).await?;
                stock.insert(line.product_id.clone(), current);
            }
            let Some((name, current)) = stock.get_mut(&line.product_id) else {
                return Err(DbError::not_found("Product", &line.product_id));
            };

            let change = apply_movement(name, *current, MovementKind::Salida, line.quantity)?;
            *current = change.resulting_stock;

            insert_line(&mut tx, &order.id, line_no, line).await?;

            let movement = StockMovement {
                id: generate_id(),
                product_id: line.product_id.clone(),
                kind: MovementKind::Salida,
                delta: change.delta,
                resulting_stock: change.resulting_stock,
                reason: Some(reason.clone()),
                authorized_by: None,
                order_id: Some(order.id.clone()),
                created_at: now,
            };
            insert_movement(&mut tx, &movement).await?;
            movements.push(movement);
        }

        for (product_id, (_, level)) in &stock {
            write_stock(&mut tx, product_id, *level, now).await?;
        }

        tx.commit().await?;

        info!(
            order_id = %order.id,
            folio = %order.folio,
            lines = draft.line_count(),
            subtotal = %order.subtotal,
            operator = %order.operator,
            "Order committed"
        );

        Ok(CommittedOrder {
            order,
            lines: draft.lines().to_vec(),
            movements,
        })
    }

    /// Cancels a completed order and returns its stock with entrada movements.
    ///
    /// Reversing a sale changes stock without new goods, so it needs the
    /// `AdjustStock` capability.
    pub async fn cancel(
        &self,
        order_id: &str,
        policy: &dyn AuthorizationPolicy,
        principal: &Principal,
    ) -> DbResult<CommittedOrder> {
        policy.check(principal, Capability::AdjustStock)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut order = fetch_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;
        if order.status != OrderStatus::Completed {
            return Err(DbError::not_found("Order (completed)", order_id));
        }

        let lines = fetch_lines(&mut tx, order_id).await?;
        let reason = format!("cancelación {}", order.folio);
        let mut movements = Vec::with_capacity(lines.len());

        for line in &lines {
            let (name, current) = read_stock(&mut tx, &line.product_id).await?;
            let change = apply_movement(&name, current, MovementKind::Entrada, line.quantity)?;
            write_stock(&mut tx, &line.product_id, change.resulting_stock, now).await?;

            let movement = StockMovement {
                id: generate_id(),
                product_id: line.product_id.clone(),
                kind: MovementKind::Entrada,
                delta: change.delta,
                resulting_stock: change.resulting_stock,
                reason: Some(reason.clone()),
                authorized_by: Some(principal.name.clone()),
                order_id: Some(order.id.clone()),
                created_at: now,
            };
            insert_movement(&mut tx, &movement).await?;
            movements.push(movement);
        }

        sqlx::query("UPDATE orders SET status = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(OrderStatus::Cancelled)
            .execute(&mut *tx)
            .await?;
        order.status = OrderStatus::Cancelled;

        tx.commit().await?;

        info!(order_id = %order.id, folio = %order.folio, by = %principal.name, "Order cancelled");
        Ok(CommittedOrder {
            order,
            lines,
            movements,
        })
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    pub async fn get_by_folio(&self, folio: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("{} WHERE folio = ?1", SELECT_ORDER))
            .bind(folio.trim())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let mut conn = self.pool.acquire().await?;
        fetch_lines(&mut conn, order_id).await
    }

    /// Newest orders first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> =
            sqlx::query_as(&format!("{} ORDER BY created_at DESC, rowid DESC LIMIT ?1", SELECT_ORDER))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Order::try_from).collect()
    }
}

async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_ORDER))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(Order::try_from).transpose()
}

async fn fetch_lines(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderLine>> {
    let rows: Vec<OrderLineRow> = sqlx::query_as(
        r#"
        SELECT id, product_id, name_snapshot, tare_id, tare_name_snapshot,
               gross_weight, box_count, quantity, unit_price, price_tier, line_total
        FROM order_lines
        WHERE order_id = ?1
        ORDER BY line_no
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(OrderLine::try_from).collect()
}

async fn insert_line(conn: &mut SqliteConnection, order_id: &str, line_no: usize, line: &OrderLine) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_lines (
            id, order_id, line_no, product_id, name_snapshot, tare_id, tare_name_snapshot,
            gross_weight, box_count, quantity, unit_price, price_tier, line_total
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&line.id)
    .bind(order_id)
    .bind(line_no as i64 + 1)
    .bind(&line.product_id)
    .bind(&line.name_snapshot)
    .bind(&line.tare_id)
    .bind(&line.tare_name_snapshot)
    .bind(line.gross_weight.value().to_string())
    .bind(line.box_count)
    .bind(line.quantity.value().to_string())
    .bind(line.unit_price.amount().to_string())
    .bind(line.price_tier.index())
    .bind(line.line_total.amount().to_string())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// `YYYYMMDD-NNNN`, numbered per day.
async fn next_folio(conn: &mut SqliteConnection, now: DateTime<Utc>) -> DbResult<String> {
    let prefix = now.format("%Y%m%d").to_string();

    let issued: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE folio LIKE ?1 || '-%'")
        .bind(&prefix)
        .fetch_one(&mut *conn)
        .await?;

    let folio = format!("{}-{:04}", prefix, issued + 1);
    debug!(folio = %folio, "Issued folio");
    Ok(folio)
}

// =============================================================================
// Unit Tests
// =============================================================================
