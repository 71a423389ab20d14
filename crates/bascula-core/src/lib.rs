//! # bascula-core: Pure Business Logic for Báscula
//!
//! This crate holds the weight-pricing rules of Báscula as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Báscula Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    bascula-pos (CLI shell)                      │   │
//! │  │    tare ──► weigh ──► order commit ──► stock move ──► report   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bascula-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   tare    │  │  pricing  │  │   order   │  │ inventory │  │   │
//! │  │   │ calculator│  │ P1..P5    │  │  draft    │  │ + auth    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  bascula-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`tare`] - Tare resolution calculator (gross → net → price)
//! - [`pricing`] - Price tiers and per-kg price resolution
//! - [`order`] - Order draft assembled from weighed lines
//! - [`inventory`] - Stock movements and the authorization gate
//! - [`auth`] - Principals, capabilities and the policy trait
//! - [`report`] - Margin math
//! - [`money`] - Decimal `Money` and `Kilograms`
//! - [`types`] - Domain types (TareSpec, Product, Client, Order...)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output
//! 2. **No I/O**: database, network and file system access stay out of here
//! 3. **Decimal Arithmetic**: weights and money use `rust_decimal`, rounded
//!    only at the end (3 decimals for kg, 2 for money)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use bascula_core::money::{Kilograms, Money};
//! use bascula_core::tare::{resolve_weight, WeightResolutionInput};
//! use bascula_core::{TareSpec, PIECE_SALE_TARE_NAME};
//! use chrono::Utc;
//! use rust_decimal::Decimal;
//!
//! let piece_sale = TareSpec {
//!     id: "sentinel".into(),
//!     name: PIECE_SALE_TARE_NAME.into(),
//!     unit_weight: Kilograms::zero(),
//!     created_at: Utc::now(),
//!     updated_at: Utc::now(),
//! };
//!
//! // 1.2345 kg at $10.00/kg
//! let out = resolve_weight(&WeightResolutionInput {
//!     selected_tare: Some(&piece_sale),
//!     gross_weight: Kilograms::new(Decimal::new(12345, 4)),
//!     box_count: 1,
//!     price_per_kg: Money::new(Decimal::new(10, 0)),
//!     available_stock: Kilograms::new(Decimal::new(100, 0)),
//! })
//! .unwrap();
//!
//! assert_eq!(out.final_quantity.to_string(), "1.235");
//! assert_eq!(out.total_price.to_string(), "$12.35");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod error;
pub mod inventory;
pub mod money;
pub mod order;
pub mod pricing;
pub mod report;
pub mod tare;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use auth::{AuthorizationPolicy, Capability, Principal, Role, RolePolicy};
pub use error::{AuthorizationError, CoreError, CoreResult, ValidationError, WeighError};
pub use inventory::MovementKind;
pub use money::{Kilograms, Money};
pub use order::OrderDraft;
pub use pricing::{PriceTier, PriceTierSet};
pub use tare::{resolve_weight, WeightResolutionInput, WeightResolutionOutput};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Name of the reserved tare that switches the calculator to piece-sale mode.
///
/// The entry is seeded by the first migration and cannot be edited or
/// deleted. No catalog tare may take this name.
pub const PIECE_SALE_TARE_NAME: &str = "NO_TARE_PIECE_SALE";

/// Maximum lines allowed in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum containers on the scale for one weighing.
///
/// ## Business Reason
/// Catches typos such as 100 instead of 10 before they silently zero out a
/// net weight.
pub const MAX_BOX_COUNT: u32 = 999;
