//! # Domain Types
//!
//! Core domain types used throughout Báscula.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TareSpec     │   │    Product      │   │     Client      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  sku            │   │  name           │       │
//! │  │  unit_weight    │   │  current_stock  │   │  default_tier   │       │
//! │  └─────────────────┘   │  prices (P1-P5) │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │   OrderLine     │   │ StockMovement   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  folio          │   │  quantity (kg)  │   │  kind           │       │
//! │  │  status         │   │  unit_price     │   │  quantity       │       │
//! │  │  subtotal       │   │  line_total     │   │  authorized_by  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for relations and joins
//! - Business ID: (sku, folio, tare name) - human-readable, potentially mutable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::inventory::MovementKind;
use crate::money::{Kilograms, Money};
use crate::pricing::{PriceTier, PriceTierSet};
use crate::PIECE_SALE_TARE_NAME;

// =============================================================================
// Tare
// =============================================================================

/// A container-weight specification ("tara").
///
/// One reserved entry, named [`PIECE_SALE_TARE_NAME`], switches the
/// calculator into piece-sale mode. Every other entry is a reusable
/// physical container (crate, box, tray) whose weight is subtracted per box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TareSpec {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name ("Caja plástica", "Reja madera"...).
    pub name: String,

    /// Weight of one empty container.
    pub unit_weight: Kilograms,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl TareSpec {
    /// True for the reserved "no tare / piece sale" entry.
    #[inline]
    pub fn is_piece_sale(&self) -> bool {
        self.name == PIECE_SALE_TARE_NAME
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product sold by weight.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown to the cashier and on the ticket.
    pub name: String,

    /// Purchase cost per kilogram (for margin reporting).
    pub cost_per_kg: Option<Money>,

    /// Kilograms on hand.
    pub current_stock: Kilograms,

    /// Per-kilogram prices P1..P5.
    #[ts(type = "Array<TierPrice>")]
    pub prices: PriceTierSet,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Client
// =============================================================================

/// A customer account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub name: String,
    /// Price tier applied unless the cashier overrides it.
    pub default_tier: PriceTier,
    /// Credit ceiling for accounts receivable, if the client buys on credit.
    pub credit_limit: Option<Money>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// The status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Lines are still being weighed.
    #[default]
    Draft,
    /// Order persisted and stock discounted.
    Completed,
    /// Order voided.
    Cancelled,
}

/// A committed sale/order header.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Human-readable order number.
    pub folio: String,
    pub client_id: Option<String>,
    pub status: OrderStatus,
    /// Tier in effect when the order was committed. Lines weighed under an
    /// earlier client or override carry their own [`OrderLine::price_tier`].
    pub price_tier: PriceTier,
    /// Sum of rounded line totals.
    pub subtotal: Money,
    /// Operator who committed the order.
    pub operator: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A weighed line.
///
/// Uses the snapshot pattern: product and tare names are frozen at the time
/// of weighing so later catalog edits do not rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    pub tare_id: String,
    /// Tare name at time of sale (frozen).
    pub tare_name_snapshot: String,
    /// As-weighed gross weight (or kilograms entered in piece-sale mode).
    pub gross_weight: Kilograms,
    pub box_count: u32,
    /// Net sellable quantity, 3 decimals.
    pub quantity: Kilograms,
    /// Price per kilogram, full precision.
    pub unit_price: Money,
    /// Tier whose price was applied when the line was weighed.
    #[serde(default)]
    pub price_tier: PriceTier,
    /// quantity × unit_price, 2 decimals.
    pub line_total: Money,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// A committed inventory movement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub kind: MovementKind,
    /// Signed change applied to stock.
    pub delta: Kilograms,
    /// Stock after the movement.
    pub resulting_stock: Kilograms,
    pub reason: Option<String>,
    /// Operator who passed the authorization gate, when one applied.
    pub authorized_by: Option<String>,
    /// Order that caused the movement (sales only).
    pub order_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
