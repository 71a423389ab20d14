//! # Inventory Commands
//!
//! Stock movements go through the authorization gate in
//! `MovementRepository::record`: ajuste and merma need the `AdjustStock`
//! capability, entrada and salida do not.

use bascula_core::{Kilograms, MovementKind, StockMovement};
use bascula_db::MovementRequest;
use tracing::debug;

use super::catalog::find_product;
use crate::error::ApiResult;
use crate::events::AppEvent;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct StockMoveRequest {
    /// SKU or id.
    pub product: String,
    pub kind: MovementKind,
    /// Positive kilograms; signed delta for ajuste.
    pub quantity: Kilograms,
    pub reason: Option<String>,
}

pub async fn move_stock(state: &AppState, request: StockMoveRequest) -> ApiResult<StockMovement> {
    debug!(product = %request.product, kind = %request.kind, quantity = %request.quantity, "move_stock command");
    let product = find_product(state, &request.product).await?;

    let movement = state
        .db()
        .movements()
        .record(
            MovementRequest {
                product_id: product.id,
                kind: request.kind,
                quantity: request.quantity,
                reason: request.reason,
            },
            state.policy.as_ref(),
            &state.principal(),
        )
        .await?;

    state.events.publish(AppEvent::StockChanged {
        product_id: movement.product_id.clone(),
        stock: movement.resulting_stock,
    });
    Ok(movement)
}

/// Newest movements first.
pub async fn stock_history(state: &AppState, product: &str, limit: u32) -> ApiResult<Vec<StockMovement>> {
    let product = find_product(state, product).await?;
    Ok(state.db().movements().list_for_product(&product.id, limit).await?)
}
