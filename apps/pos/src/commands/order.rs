//! # Order Commands
//!
//! ```text
//! ┌──────────┐  weigh   ┌──────────┐  commit  ┌───────────┐  cancel  ┌───────────┐
//! │  Empty   │─────────►│  Draft   │─────────►│ Completed │─────────►│ Cancelled │
//! │  draft   │◄─────────│ (lines)  │          │  (folio)  │ (gated)  │           │
//! └──────────┘  clear   └──────────┘          └───────────┘          └───────────┘
//!                         │    ▲
//!                         └────┘ remove-line, client, tier
//! ```

use bascula_core::order::DraftTotals;
use bascula_core::{Order, OrderLine, PriceTier};
use bascula_db::CommittedOrder;
use serde::Serialize;
use tracing::{debug, info};

use super::catalog::find_client;
use crate::error::{ApiError, ApiResult};
use crate::events::AppEvent;
use crate::state::AppState;

/// The open order as shown to the cashier.
#[derive(Debug, Clone, Serialize)]
pub struct DraftView {
    pub client_id: Option<String>,
    pub lines: Vec<OrderLine>,
    pub totals: DraftTotals,
}

/// A persisted order with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

impl From<CommittedOrder> for OrderView {
    fn from(committed: CommittedOrder) -> Self {
        OrderView {
            order: committed.order,
            lines: committed.lines,
        }
    }
}

pub async fn show_draft(state: &AppState) -> ApiResult<DraftView> {
    state.draft.with_draft(|d| DraftView {
        client_id: d.client_id().map(str::to_string),
        lines: d.lines().to_vec(),
        totals: DraftTotals::from(d),
    })
}

/// Assigns a client (by id or name) or, with `None`, removes it.
pub async fn set_client(state: &AppState, key: Option<&str>) -> ApiResult<DraftView> {
    let client = match key {
        Some(key) => Some(find_client(state, key).await?),
        None => None,
    };
    state.draft.with_draft_mut(|d| d.set_client(client.as_ref()))?;
    state.draft.persist()?;
    show_draft(state).await
}

/// Forces a tier for the lines weighed next; `None` goes back to the
/// client's default.
pub async fn set_tier(state: &AppState, tier: Option<PriceTier>) -> ApiResult<DraftView> {
    state.draft.with_draft_mut(|d| d.set_override_tier(tier))?;
    state.draft.persist()?;
    show_draft(state).await
}

pub async fn remove_line(state: &AppState, line_id: &str) -> ApiResult<DraftView> {
    debug!(line_id = %line_id, "remove_line command");
    state.draft.with_draft_mut(|d| d.remove_line(line_id))??;
    state.draft.persist()?;
    show_draft(state).await
}

pub async fn clear_draft(state: &AppState) -> ApiResult<DraftView> {
    state.draft.with_draft_mut(|d| d.clear())?;
    state.draft.persist()?;
    show_draft(state).await
}

/// Persists the draft and empties it.
///
/// The draft is only cleared after the database commit succeeds; a failed
/// commit (stock fell since weighing) leaves every line in place.
pub async fn commit(state: &AppState) -> ApiResult<OrderView> {
    let draft = state.draft.with_draft(|d| d.clone())?;
    let operator = state.principal().name;

    let committed = state.db().orders().commit(&draft, &operator).await?;

    state.draft.with_draft_mut(|d| d.clear())?;
    state.draft.persist()?;

    info!(folio = %committed.order.folio, subtotal = %committed.order.subtotal, "Order committed");
    publish_stock(state, &committed);
    state.events.publish(AppEvent::OrderCommitted {
        order_id: committed.order.id.clone(),
        folio: committed.order.folio.clone(),
    });

    Ok(committed.into())
}

/// Cancels a completed order by folio or id and returns its stock.
pub async fn cancel(state: &AppState, key: &str) -> ApiResult<OrderView> {
    let order = find_order(state, key).await?;
    let committed = state
        .db()
        .orders()
        .cancel(&order.id, state.policy.as_ref(), &state.principal())
        .await?;

    publish_stock(state, &committed);
    Ok(committed.into())
}

pub async fn get_order(state: &AppState, key: &str) -> ApiResult<OrderView> {
    let order = find_order(state, key).await?;
    let lines = state.db().orders().get_lines(&order.id).await?;
    Ok(OrderView { order, lines })
}

pub async fn list_orders(state: &AppState, limit: u32) -> ApiResult<Vec<Order>> {
    Ok(state.db().orders().list_recent(limit).await?)
}

async fn find_order(state: &AppState, key: &str) -> ApiResult<Order> {
    let orders = state.db().orders();
    if let Some(order) = orders.get_by_folio(key).await? {
        return Ok(order);
    }
    orders
        .get_by_id(key)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", key))
}

fn publish_stock(state: &AppState, committed: &CommittedOrder) {
    for (product_id, stock) in committed.stock_levels() {
        state.events.publish(AppEvent::StockChanged { product_id, stock });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::catalog::{add_client, find_product};
    use crate::commands::inventory::{move_stock, StockMoveRequest};
    use crate::commands::test_support::{product, state_as};
    use crate::commands::weighing::{weigh, WeighRequest};
    use crate::error::ErrorCode;
    use bascula_core::{Kilograms, MovementKind, OrderStatus, Role, PIECE_SALE_TARE_NAME};
    use bascula_db::NewClient;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    async fn weigh_piece(state: &AppState, sku: &str, kg: Decimal) -> OrderLine {
        weigh(
            state,
            WeighRequest {
                product: sku.to_string(),
                tare: Some(PIECE_SALE_TARE_NAME.to_string()),
                gross_weight: Kilograms::new(kg),
                box_count: 1,
            },
        )
        .await
        .unwrap()
        .line
    }

    #[tokio::test]
    async fn test_commit_clears_draft_and_publishes() {
        let state = state_as(Role::Cashier).await;
        product(&state, "JIT", dec!(10), dec!(20)).await;
        weigh_piece(&state, "JIT", dec!(2)).await;
        weigh_piece(&state, "JIT", dec!(3)).await;

        let mut events = state.events.subscribe();
        let view = commit(&state).await.unwrap();

        assert_eq!(view.order.status, OrderStatus::Completed);
        assert_eq!(view.order.subtotal.amount(), dec!(50.00));
        assert_eq!(view.order.operator, "cashier-1");
        assert_eq!(view.lines.len(), 2);
        assert!(show_draft(&state).await.unwrap().lines.is_empty());

        match events.recv().await.unwrap() {
            AppEvent::StockChanged { stock, .. } => assert_eq!(stock.value(), dec!(15)),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(events.recv().await.unwrap(), AppEvent::OrderCommitted { .. }));

        let fetched = get_order(&state, &view.order.folio).await.unwrap();
        assert_eq!(fetched.lines, view.lines);
        assert_eq!(list_orders(&state, 5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_draft() {
        let state = state_as(Role::Supervisor).await;
        product(&state, "JIT", dec!(10), dec!(5)).await;
        weigh_piece(&state, "JIT", dec!(4)).await;

        move_stock(
            &state,
            StockMoveRequest {
                product: "JIT".to_string(),
                kind: MovementKind::Merma,
                quantity: Kilograms::new(dec!(2)),
                reason: Some("magullado".to_string()),
            },
        )
        .await
        .unwrap();

        let err = commit(&state).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(show_draft(&state).await.unwrap().lines.len(), 1);
    }

    #[tokio::test]
    async fn test_client_tier_prices_new_lines() {
        let state = state_as(Role::Admin).await;
        product(&state, "JIT", dec!(10), dec!(20)).await;
        add_client(
            &state,
            NewClient {
                name: "Fonda".to_string(),
                default_tier: PriceTier::new(2).unwrap(),
                credit_limit: None,
            },
        )
        .await
        .unwrap();

        set_client(&state, Some("Fonda")).await.unwrap();
        let line = weigh_piece(&state, "JIT", dec!(1)).await;
        assert_eq!(line.unit_price.amount(), dec!(9));

        // tier 4 has no price: falls back to tier 1
        let view = set_tier(&state, Some(PriceTier::new(4).unwrap())).await.unwrap();
        assert_eq!(view.totals.price_tier.index(), 4);
        let line = weigh_piece(&state, "JIT", dec!(1)).await;
        assert_eq!(line.unit_price.amount(), dec!(10));

        let view = remove_line(&state, &line.id).await.unwrap();
        assert_eq!(view.lines.len(), 1);
        let err = remove_line(&state, &line.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        assert!(clear_draft(&state).await.unwrap().client_id.is_none());
    }

    #[tokio::test]
    async fn test_empty_commit_and_gated_cancel() {
        let state = state_as(Role::Cashier).await;
        let err = commit(&state).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderError);

        product(&state, "JIT", dec!(10), dec!(20)).await;
        weigh_piece(&state, "JIT", dec!(5)).await;
        let view = commit(&state).await.unwrap();

        let err = cancel(&state, &view.order.folio).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let stock = find_product(&state, "JIT").await.unwrap().current_stock;
        assert_eq!(stock.value(), dec!(15));
    }
}
