//! # Stock Movement Repository
//!
//! The inventory ledger and the gated movement workflow.
//!
//! ```text
//! record(request, policy, principal)
//!      │
//!      ├── authorize_movement()   ajuste/merma need AdjustStock
//!      │
//!      ├── BEGIN
//!      ├── read current_stock
//!      ├── apply_movement()       entrada +q, salida/merma -q, ajuste ±q
//!      ├── UPDATE products.current_stock
//!      ├── INSERT stock_movements (authorized_by = principal for gated kinds)
//!      └── COMMIT
//! ```

use bascula_core::inventory::{apply_movement, authorize_movement, MovementKind};
use bascula_core::{AuthorizationPolicy, Kilograms, Principal, StockMovement};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::product::write_stock;
use crate::repository::{generate_id, kilograms_column};

#[derive(Debug, FromRow)]
struct MovementRow {
    id: String,
    product_id: String,
    kind: MovementKind,
    delta: String,
    resulting_stock: String,
    reason: Option<String>,
    authorized_by: Option<String>,
    order_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = DbError;

    fn try_from(row: MovementRow) -> DbResult<Self> {
        Ok(StockMovement {
            delta: kilograms_column("stock_movements.delta", &row.delta)?,
            resulting_stock: kilograms_column("stock_movements.resulting_stock", &row.resulting_stock)?,
            id: row.id,
            product_id: row.product_id,
            kind: row.kind,
            reason: row.reason,
            authorized_by: row.authorized_by,
            order_id: row.order_id,
            created_at: row.created_at,
        })
    }
}

/// A movement to record.
#[derive(Debug, Clone)]
pub struct MovementRequest {
    pub product_id: String,
    pub kind: MovementKind,
    /// Positive for entrada/salida/merma; signed delta for ajuste.
    pub quantity: Kilograms,
    pub reason: Option<String>,
}

/// Repository for inventory movements.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Runs the authorization gate, then applies and records the movement.
    ///
    /// ## Errors
    /// - `Domain(Authorization)` when the principal lacks `AdjustStock`
    ///   for an ajuste or merma; nothing is written
    /// - `Domain(InsufficientStock)` when stock would go negative
    /// - `NotFound` for an unknown product
    pub async fn record(
        &self,
        request: MovementRequest,
        policy: &dyn AuthorizationPolicy,
        principal: &Principal,
    ) -> DbResult<StockMovement> {
        let authorized_by = authorize_movement(policy, principal, request.kind)?;

        let mut tx = self.pool.begin().await?;

        let (name, current) = read_stock(&mut tx, &request.product_id).await?;
        let change = apply_movement(&name, current, request.kind, request.quantity)?;
        let now = Utc::now();

        write_stock(&mut tx, &request.product_id, change.resulting_stock, now).await?;

        let movement = StockMovement {
            id: generate_id(),
            product_id: request.product_id,
            kind: request.kind,
            delta: change.delta,
            resulting_stock: change.resulting_stock,
            reason: request
                .reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            authorized_by,
            order_id: None,
            created_at: now,
        };
        insert_movement(&mut tx, &movement).await?;

        tx.commit().await?;

        info!(
            product_id = %movement.product_id,
            kind = %movement.kind,
            delta = %movement.delta,
            stock = %movement.resulting_stock,
            operator = %principal.name,
            "Stock movement recorded"
        );
        Ok(movement)
    }

    /// Most recent movements for a product, newest first.
    pub async fn list_for_product(&self, product_id: &str, limit: u32) -> DbResult<Vec<StockMovement>> {
        let rows: Vec<MovementRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, kind, delta, resulting_stock, reason, authorized_by, order_id, created_at
            FROM stock_movements
            WHERE product_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(product_id = %product_id, count = rows.len(), "Listed movements");
        rows.into_iter().map(StockMovement::try_from).collect()
    }
}

/// Product name and stock, read inside the caller's transaction.
pub(crate) async fn read_stock(conn: &mut SqliteConnection, product_id: &str) -> DbResult<(String, Kilograms)> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT name, current_stock FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    let (name, stock) = row.ok_or_else(|| DbError::not_found("Product", product_id))?;
    Ok((name, kilograms_column("products.current_stock", &stock)?))
}

pub(crate) async fn insert_movement(conn: &mut SqliteConnection, movement: &StockMovement) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, kind, delta, resulting_stock,
            reason, authorized_by, order_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(movement.kind)
    .bind(movement.delta.value().to_string())
    .bind(movement.resulting_stock.value().to_string())
    .bind(&movement.reason)
    .bind(&movement.authorized_by)
    .bind(&movement.order_id)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{product_with_stock, test_db};
    use bascula_core::{CoreError, Role, RolePolicy};
    use rust_decimal_macros::dec;

    fn request(product_id: &str, kind: MovementKind, qty: rust_decimal::Decimal) -> MovementRequest {
        MovementRequest {
            product_id: product_id.to_string(),
            kind,
            quantity: Kilograms::new(qty),
            reason: Some("conteo".to_string()),
        }
    }

    #[tokio::test]
    async fn test_cashier_can_receive_goods() {
        let db = test_db().await;
        let product = product_with_stock(&db, "PAP", dec!(18), dec!(10)).await;
        let cashier = Principal::new("caro", Role::Cashier);

        let movement = db
            .movements()
            .record(request(&product.id, MovementKind::Entrada, dec!(5.5)), &RolePolicy, &cashier)
            .await
            .unwrap();

        assert_eq!(movement.resulting_stock.value(), dec!(15.5));
        assert_eq!(movement.authorized_by, None);

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.current_stock.value(), dec!(15.5));
    }

    #[tokio::test]
    async fn test_cashier_merma_denied_and_nothing_written() {
        let db = test_db().await;
        let product = product_with_stock(&db, "PAP", dec!(18), dec!(10)).await;
        let cashier = Principal::new("caro", Role::Cashier);

        let err = db
            .movements()
            .record(request(&product.id, MovementKind::Merma, dec!(1)), &RolePolicy, &cashier)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Authorization(_))));

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.current_stock.value(), dec!(10));
        assert_eq!(db.movements().list_for_product(&product.id, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_supervisor_ajuste_records_authorizer() {
        let db = test_db().await;
        let product = product_with_stock(&db, "PAP", dec!(18), dec!(10)).await;
        let supervisor = Principal::new("beto", Role::Supervisor);

        let movement = db
            .movements()
            .record(request(&product.id, MovementKind::Ajuste, dec!(-2.25)), &RolePolicy, &supervisor)
            .await
            .unwrap();

        assert_eq!(movement.delta.value(), dec!(-2.25));
        assert_eq!(movement.resulting_stock.value(), dec!(7.75));
        assert_eq!(movement.authorized_by.as_deref(), Some("beto"));

        let history = db.movements().list_for_product(&product.id, 10).await.unwrap();
        assert_eq!(history[0].id, movement.id);
        assert_eq!(history[0].reason.as_deref(), Some("conteo"));
    }

    #[tokio::test]
    async fn test_salida_beyond_stock_rejected() {
        let db = test_db().await;
        let product = product_with_stock(&db, "PAP", dec!(18), dec!(1)).await;
        let admin = Principal::new("ana", Role::Admin);

        let err = db
            .movements()
            .record(request(&product.id, MovementKind::Salida, dec!(1.5)), &RolePolicy, &admin)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let db = test_db().await;
        let admin = Principal::new("ana", Role::Admin);

        let err = db
            .movements()
            .record(request("missing", MovementKind::Entrada, dec!(1)), &RolePolicy, &admin)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
