//! # Order Draft
//!
//! Accumulates weighed lines until the order is committed.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Order Draft Flow                                    │
//! │                                                                         │
//! │  set_client / set_override_tier                                         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  add_weighed_line(product, tare, gross, boxes)                          │
//! │        ├── price_per_kg   = tier resolution                             │
//! │        ├── available      = stock - already drafted for product         │
//! │        ├── resolve_weight(...)                                          │
//! │        └── push OrderLine (snapshots + calculator output)               │
//! │                                                                         │
//! │  remove_line(id) / clear()                                              │
//! │                                                                         │
//! │  subtotal() = Σ line_total      (each already rounded to 2dp)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, WeighError};
use crate::money::{Kilograms, Money};
use crate::pricing::{resolve_tier_price, select_tier, PriceTier, TierPrice};
use crate::tare::{resolve_weight, WeightResolutionInput, WeightResolutionOutput};
use crate::types::{Client, OrderLine, Product, TareSpec};
use crate::MAX_ORDER_LINES;

/// An order being assembled at the scale.
///
/// ## Invariants
/// - At most [`MAX_ORDER_LINES`] lines
/// - For every product, the sum of its line quantities never exceeds the
///   stock it had when each line was weighed
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderDraft {
    client_id: Option<String>,
    client_tier: Option<PriceTier>,
    override_tier: Option<PriceTier>,
    lines: Vec<OrderLine>,
    created_at: DateTime<Utc>,
}

impl OrderDraft {
    pub fn new() -> Self {
        OrderDraft {
            created_at: Utc::now(),
            ..Default::default()
        }
    }

    /// Assigns (or removes) the client. Existing lines keep their prices.
    pub fn set_client(&mut self, client: Option<&Client>) {
        self.client_id = client.map(|c| c.id.clone());
        self.client_tier = client.map(|c| c.default_tier);
    }

    /// Forces a tier for lines weighed from now on.
    pub fn set_override_tier(&mut self, tier: Option<PriceTier>) {
        self.override_tier = tier;
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Tier that new lines are priced at.
    pub fn effective_tier(&self) -> PriceTier {
        select_tier(self.client_tier, self.override_tier)
    }

    /// Per-kilogram price the next line of `product` would get.
    pub fn price_for(&self, product: &Product) -> Money {
        self.tier_price_for(product).price
    }

    /// The tier and price the next line of `product` would get.
    pub fn tier_price_for(&self, product: &Product) -> TierPrice {
        resolve_tier_price(&product.prices, self.client_tier, self.override_tier)
    }

    /// Kilograms of a product already in the draft.
    pub fn quantity_for(&self, product_id: &str) -> Kilograms {
        self.lines
            .iter()
            .filter(|l| l.product_id == product_id)
            .map(|l| l.quantity)
            .sum()
    }

    /// Stock still free for this draft.
    pub fn available_for(&self, product: &Product) -> Kilograms {
        let available = product.current_stock - self.quantity_for(&product.id);
        if available.is_negative() {
            Kilograms::zero()
        } else {
            available
        }
    }

    /// Runs the calculator without touching the draft.
    pub fn preview(
        &self,
        product: &Product,
        tare: Option<&TareSpec>,
        gross_weight: Kilograms,
        box_count: u32,
    ) -> CoreResult<WeightResolutionOutput> {
        let output = resolve_weight(&WeightResolutionInput {
            selected_tare: tare,
            gross_weight,
            box_count,
            price_per_kg: self.price_for(product),
            available_stock: self.available_for(product),
        })?;
        Ok(output)
    }

    /// Weighs a line and appends it.
    ///
    /// ## Errors
    /// - Any [`WeighError`] from the calculator
    /// - [`CoreError::OrderTooLarge`] past [`MAX_ORDER_LINES`]
    pub fn add_weighed_line(
        &mut self,
        product: &Product,
        tare: Option<&TareSpec>,
        gross_weight: Kilograms,
        box_count: u32,
    ) -> CoreResult<&OrderLine> {
        if self.lines.len() >= MAX_ORDER_LINES {
            return Err(CoreError::OrderTooLarge {
                max: MAX_ORDER_LINES,
            });
        }

        let tare = tare.ok_or(WeighError::NoTareSelected)?;
        let applied = self.tier_price_for(product);
        let output = self.preview(product, Some(tare), gross_weight, box_count)?;

        self.lines.push(OrderLine {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            name_snapshot: product.name.clone(),
            tare_id: tare.id.clone(),
            tare_name_snapshot: tare.name.clone(),
            gross_weight,
            box_count: if tare.is_piece_sale() { 0 } else { box_count },
            quantity: output.final_quantity,
            unit_price: output.unit_price,
            price_tier: applied.tier,
            line_total: output.total_price,
        });

        let idx = self.lines.len() - 1;
        Ok(&self.lines[idx])
    }

    /// Removes a line by id and returns it.
    pub fn remove_line(&mut self, line_id: &str) -> CoreResult<OrderLine> {
        let pos = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;
        Ok(self.lines.remove(pos))
    }

    /// Empties the draft and forgets the client and override.
    pub fn clear(&mut self) {
        *self = OrderDraft::new();
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// No lines, no client and no tier override: nothing worth keeping.
    pub fn is_blank(&self) -> bool {
        self.lines.is_empty() && self.client_id.is_none() && self.override_tier.is_none()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_quantity(&self) -> Kilograms {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of the already-rounded line totals.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(|l| l.line_total).sum()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Quantity per product, for the commit-time stock re-check.
    pub fn quantities_by_product(&self) -> Vec<(String, Kilograms)> {
        let mut totals: Vec<(String, Kilograms)> = Vec::new();
        for line in &self.lines {
            match totals.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, qty)) => *qty += line.quantity,
                None => totals.push((line.product_id.clone(), line.quantity)),
            }
        }
        totals
    }
}

/// Draft summary for the UI and CLI.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DraftTotals {
    pub line_count: usize,
    pub total_quantity: Kilograms,
    pub subtotal: Money,
    pub price_tier: PriceTier,
}

impl From<&OrderDraft> for DraftTotals {
    fn from(draft: &OrderDraft) -> Self {
        DraftTotals {
            line_count: draft.line_count(),
            total_quantity: draft.total_quantity(),
            subtotal: draft.subtotal(),
            price_tier: draft.effective_tier(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
