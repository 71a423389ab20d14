//! # Weighing Commands
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator at the scale                                                  │
//! │                                                                         │
//! │  product ──┐                                                            │
//! │  tare ─────┤   fetch product (fresh stock) and tare                     │
//! │  gross ────┼─► OrderDraft::add_weighed_line                             │
//! │  boxes ────┘       ├── price = client/override tier                     │
//! │                    ├── available = stock - already drafted              │
//! │                    └── resolve_weight                                   │
//! │                             │                                           │
//! │            ┌────────────────┴───────────────┐                           │
//! │            ▼                                ▼                           │
//! │   line appended, draft saved,        NoTareSelected / InvalidQuantity / │
//! │   WeighedLineAdded published         NegativeNetWeight / Insufficient   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bascula_core::order::DraftTotals;
use bascula_core::{Kilograms, OrderLine, Product, TareSpec, WeightResolutionOutput};
use serde::Serialize;
use tracing::{debug, info};

use super::catalog::find_product;
use super::tare::find_tare;
use crate::error::{ApiError, ApiResult};
use crate::events::AppEvent;
use crate::state::AppState;

/// One reading from the scale.
#[derive(Debug, Clone)]
pub struct WeighRequest {
    /// SKU or id.
    pub product: String,
    /// Tare id or name; `None` when the operator has not picked one.
    pub tare: Option<String>,
    pub gross_weight: Kilograms,
    pub box_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub product: String,
    pub tare: String,
    pub result: WeightResolutionOutput,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeighResponse {
    pub line: OrderLine,
    pub totals: DraftTotals,
}

async fn load_inputs(state: &AppState, request: &WeighRequest) -> ApiResult<(Product, Option<TareSpec>)> {
    let product = find_product(state, &request.product).await?;
    if !product.is_active {
        return Err(ApiError::validation("Product is not available for sale"));
    }
    let tare = match &request.tare {
        Some(key) => Some(find_tare(state, key).await?),
        None => None,
    };
    Ok((product, tare))
}

/// Runs the calculator without changing the draft.
pub async fn preview(state: &AppState, request: WeighRequest) -> ApiResult<PreviewResponse> {
    let (product, tare) = load_inputs(state, &request).await?;
    let tare = tare.ok_or(bascula_core::WeighError::NoTareSelected)?;

    let result = state
        .draft
        .with_draft(|d| d.preview(&product, Some(&tare), request.gross_weight, request.box_count))??;

    Ok(PreviewResponse {
        product: product.name,
        tare: tare.name,
        result,
    })
}

/// Weighs a line into the open order.
pub async fn weigh(state: &AppState, request: WeighRequest) -> ApiResult<WeighResponse> {
    debug!(
        product = %request.product,
        tare = ?request.tare,
        gross = %request.gross_weight,
        boxes = request.box_count,
        "weigh command"
    );
    let (product, tare) = load_inputs(state, &request).await?;

    let response = state.draft.with_draft_mut(|d| {
        let line = d
            .add_weighed_line(&product, tare.as_ref(), request.gross_weight, request.box_count)?
            .clone();
        Ok::<_, ApiError>(WeighResponse {
            line,
            totals: DraftTotals::from(&*d),
        })
    })??;

    state.draft.persist()?;

    info!(
        product = %response.line.name_snapshot,
        quantity = %response.line.quantity,
        total = %response.line.line_total,
        "Line weighed"
    );
    state.events.publish(AppEvent::WeighedLineAdded {
        line: response.line.clone(),
    });
    Ok(response)
}
