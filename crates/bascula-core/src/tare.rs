//! # Tare Resolution
//!
//! Converts an as-weighed measurement into a billable net quantity and price.
//!
//! ## Two Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tare Resolution Calculator                          │
//! │                                                                         │
//! │  selected tare == NO_TARE_PIECE_SALE ?                                 │
//! │        │                                                                │
//! │   yes  │                          no (container mode)                   │
//! │        ▼                                 ▼                              │
//! │  quantity = round(gross, 3)       tare_total = unit_weight × boxes     │
//! │                                   net        = gross - tare_total       │
//! │                                   net ≤ 0 → NegativeNetWeight           │
//! │                                   quantity   = round(net, 3)            │
//! │        │                                 │                              │
//! │        └───────────────┬─────────────────┘                              │
//! │                        ▼                                                │
//! │           unit_price  = price_per_kg   (full precision)                 │
//! │           quantity > available → InsufficientStock                     │
//! │           quantity ≤ 0         → InvalidQuantity                        │
//! │           total_price = round(quantity × unit_price, 2)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculator is a pure function: no side effects, no hidden state, safe
//! to call again after the operator fixes an input.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{ValidationError, WeighError, WeighResult};
use crate::money::{Kilograms, Money};
use crate::types::TareSpec;
use crate::validation::{validate_box_count, validate_price};

/// Everything the operator entered for one weighed line.
#[derive(Debug, Clone, Copy)]
pub struct WeightResolutionInput<'a> {
    /// Tare picked in the UI. `None` until the operator chooses one.
    pub selected_tare: Option<&'a TareSpec>,
    /// Gross weight (container mode) or kilograms to sell (piece-sale mode).
    pub gross_weight: Kilograms,
    /// Number of containers on the scale. Ignored in piece-sale mode.
    pub box_count: u32,
    /// Price resolved from the product's tier set.
    pub price_per_kg: Money,
    /// Upper bound for the resolved quantity.
    pub available_stock: Kilograms,
}

/// The calculator's result, handed to order assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WeightResolutionOutput {
    /// Net sellable kilograms, rounded to 3 decimals.
    pub final_quantity: Kilograms,
    /// Price per kilogram, never rounded.
    pub unit_price: Money,
    /// final_quantity × unit_price rounded to 2 decimals.
    pub total_price: Money,
}

/// Runs the tare resolution for one line.
///
/// ## Example
/// ```rust
/// use bascula_core::money::{Kilograms, Money};
/// use bascula_core::tare::{resolve_weight, WeightResolutionInput};
/// use bascula_core::TareSpec;
/// use chrono::Utc;
/// use rust_decimal::Decimal;
///
/// let crate_tare = TareSpec {
///     id: "t1".into(),
///     name: "Reja".into(),
///     unit_weight: Kilograms::new(Decimal::new(25, 1)), // 2.5 kg
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
///
/// let out = resolve_weight(&WeightResolutionInput {
///     selected_tare: Some(&crate_tare),
///     gross_weight: Kilograms::new(Decimal::new(50, 0)),
///     box_count: 4,
///     price_per_kg: Money::new(Decimal::new(10, 0)),
///     available_stock: Kilograms::new(Decimal::new(100, 0)),
/// })
/// .unwrap();
///
/// assert_eq!(out.final_quantity.value(), Decimal::new(40, 0));
/// assert_eq!(out.total_price.to_string(), "$400.00");
/// ```
pub fn resolve_weight(input: &WeightResolutionInput<'_>) -> WeighResult<WeightResolutionOutput> {
    let tare = input.selected_tare.ok_or(WeighError::NoTareSelected)?;

    validate_price("price per kg", input.price_per_kg)?;

    let final_quantity = if tare.is_piece_sale() {
        if !input.gross_weight.is_positive() {
            return Err(WeighError::InvalidQuantity {
                quantity: input.gross_weight,
            });
        }
        input.gross_weight.rounded()
    } else {
        validate_box_count(input.box_count)?;

        // Subtract at full precision; round only the result
        let tare_total = tare
            .unit_weight
            .checked_times(input.box_count)
            .ok_or_else(|| too_large("tare total"))?;
        let net = input
            .gross_weight
            .checked_sub(tare_total)
            .ok_or_else(|| too_large("net weight"))?;
        if !net.is_positive() {
            return Err(WeighError::NegativeNetWeight {
                gross: input.gross_weight,
                tare_total,
                net,
            });
        }
        net.rounded()
    };

    let unit_price = input.price_per_kg;

    if final_quantity > input.available_stock {
        return Err(WeighError::InsufficientStock {
            requested: final_quantity,
            available: input.available_stock,
        });
    }

    // A net weight under half a gram rounds to zero
    if !final_quantity.is_positive() {
        return Err(WeighError::InvalidQuantity {
            quantity: final_quantity,
        });
    }

    let total_price = unit_price
        .checked_times(final_quantity)
        .ok_or_else(|| too_large("total price"))?
        .rounded();

    debug!(
        tare = %tare.name,
        quantity = %final_quantity,
        unit_price = %unit_price.amount(),
        total = %total_price,
        "Weight resolved"
    );

    Ok(WeightResolutionOutput {
        final_quantity,
        unit_price,
        total_price,
    })
}

fn too_large(field: &str) -> WeighError {
    ValidationError::TooLarge {
        field: field.to_string(),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PIECE_SALE_TARE_NAME;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn kg(v: Decimal) -> Kilograms {
        Kilograms::new(v)
    }

    fn money(v: Decimal) -> Money {
        Money::new(v)
    }

    fn container(unit_weight: Decimal) -> TareSpec {
        TareSpec {
            id: "tare-box".to_string(),
            name: "Caja".to_string(),
            unit_weight: kg(unit_weight),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn piece_sale() -> TareSpec {
        TareSpec {
            id: "tare-piece".to_string(),
            name: PIECE_SALE_TARE_NAME.to_string(),
            unit_weight: Kilograms::zero(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn input(
        tare: &TareSpec,
        gross: Decimal,
        boxes: u32,
        price: Decimal,
        stock: Decimal,
    ) -> WeightResolutionInput<'_> {
        WeightResolutionInput {
            selected_tare: Some(tare),
            gross_weight: kg(gross),
            box_count: boxes,
            price_per_kg: money(price),
            available_stock: kg(stock),
        }
    }

    #[test]
    fn test_container_mode_scenario() {
        let tare = container(dec!(2.5));
        let out = resolve_weight(&input(&tare, dec!(50.0), 4, dec!(10.00), dec!(100))).unwrap();

        assert_eq!(out.final_quantity, kg(dec!(40.000)));
        assert_eq!(out.unit_price, money(dec!(10.00)));
        assert_eq!(out.total_price, money(dec!(400.00)));
    }

    #[test]
    fn test_piece_sale_scenario() {
        let tare = piece_sale();
        let out = resolve_weight(&input(&tare, dec!(3.250), 1, dec!(25.00), dec!(5))).unwrap();

        assert_eq!(out.final_quantity, kg(dec!(3.250)));
        assert_eq!(out.unit_price, money(dec!(25.00)));
        assert_eq!(out.total_price, money(dec!(81.25)));
    }

    #[test]
    fn test_gross_equal_to_tare_total_fails() {
        let tare = container(dec!(5.0));
        let err = resolve_weight(&input(&tare, dec!(10.0), 2, dec!(10), dec!(100))).unwrap_err();

        match err {
            WeighError::NegativeNetWeight { tare_total, net, .. } => {
                assert_eq!(tare_total, kg(dec!(10.0)));
                assert!(net.is_zero());
            }
            other => panic!("expected NegativeNetWeight, got {:?}", other),
        }
    }

    #[test]
    fn test_gross_below_tare_total_fails() {
        let tare = container(dec!(5.0));
        let err = resolve_weight(&input(&tare, dec!(9.999), 2, dec!(10), dec!(100))).unwrap_err();
        assert!(matches!(err, WeighError::NegativeNetWeight { .. }));
    }

    #[test]
    fn test_net_above_stock_fails_with_both_amounts() {
        let tare = container(dec!(1.0));
        let err = resolve_weight(&input(&tare, dec!(120.0), 1, dec!(10), dec!(100))).unwrap_err();

        assert_eq!(
            err,
            WeighError::InsufficientStock {
                requested: kg(dec!(119.0)),
                available: kg(dec!(100)),
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("119"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn test_stock_boundary() {
        let tare = container(dec!(1.0));

        // Exactly the available stock succeeds
        let ok = resolve_weight(&input(&tare, dec!(101.0), 1, dec!(10), dec!(100)));
        assert_eq!(ok.unwrap().final_quantity, kg(dec!(100)));

        // One gram above fails
        let err = resolve_weight(&input(&tare, dec!(101.001), 1, dec!(10), dec!(100)));
        assert!(matches!(err, Err(WeighError::InsufficientStock { .. })));
    }

    #[test]
    fn test_no_tare_selected() {
        let req = WeightResolutionInput {
            selected_tare: None,
            gross_weight: kg(dec!(10)),
            box_count: 1,
            price_per_kg: money(dec!(10)),
            available_stock: kg(dec!(100)),
        };
        assert_eq!(resolve_weight(&req), Err(WeighError::NoTareSelected));
    }

    #[test]
    fn test_piece_sale_rejects_zero_weight() {
        let tare = piece_sale();
        let err = resolve_weight(&input(&tare, dec!(0), 1, dec!(10), dec!(5))).unwrap_err();
        assert!(matches!(err, WeighError::InvalidQuantity { .. }));
    }

    #[test]
    fn test_piece_sale_rejects_negative_weight() {
        let tare = piece_sale();
        let err = resolve_weight(&input(&tare, dec!(-1.5), 1, dec!(10), dec!(5))).unwrap_err();
        assert!(matches!(err, WeighError::InvalidQuantity { .. }));
    }

    #[test]
    fn test_piece_sale_ignores_box_count() {
        let tare = piece_sale();
        let out = resolve_weight(&input(&tare, dec!(2), 0, dec!(10), dec!(5))).unwrap();
        assert_eq!(out.final_quantity, kg(dec!(2)));
    }

    #[test]
    fn test_container_mode_requires_a_box() {
        let tare = container(dec!(1.0));
        let err = resolve_weight(&input(&tare, dec!(10), 0, dec!(10), dec!(100))).unwrap_err();
        assert!(matches!(err, WeighError::Validation(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn test_negative_price_rejected() {
        let tare = container(dec!(1.0));
        let err = resolve_weight(&input(&tare, dec!(10), 1, dec!(-1), dec!(100))).unwrap_err();
        assert!(matches!(err, WeighError::Validation(ValidationError::Negative { .. })));
    }

    #[test]
    fn test_oversized_weight_is_rejected_not_panicking() {
        // piece sale: stock check comes before the total is computed
        let piece = piece_sale();
        let huge = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0); // 1e20 kg
        let price = dec!(1000000000);
        let err = resolve_weight(&input(&piece, huge, 1, price, dec!(5))).unwrap_err();
        assert!(matches!(err, WeighError::InsufficientStock { .. }));

        // enough stock, but quantity × price does not fit a decimal
        let err = resolve_weight(&input(&piece, huge, 1, price, huge)).unwrap_err();
        assert!(matches!(err, WeighError::Validation(ValidationError::TooLarge { .. })));

        // container: unit weight × boxes overflows
        let tare = container(Decimal::MAX);
        let err = resolve_weight(&input(&tare, dec!(10), 2, dec!(10), dec!(100))).unwrap_err();
        assert!(matches!(err, WeighError::Validation(ValidationError::TooLarge { .. })));
    }

    #[test]
    fn test_sub_gram_net_rounds_to_zero_and_fails() {
        // net = 0.0004 kg: positive before rounding, zero after
        let tare = container(dec!(1.0));
        let err = resolve_weight(&input(&tare, dec!(1.0004), 1, dec!(10), dec!(100))).unwrap_err();
        assert!(matches!(err, WeighError::InvalidQuantity { .. }));
    }

    #[test]
    fn test_no_premature_rounding_of_tare() {
        // 3 × 0.3335 = 1.0005; rounding the tare first would give 0.999
        let tare = container(dec!(0.3335));
        let out = resolve_weight(&input(&tare, dec!(2.0), 3, dec!(1), dec!(100))).unwrap();
        assert_eq!(out.final_quantity, kg(dec!(0.9995)).rounded());
        assert_eq!(out.final_quantity, kg(dec!(1.000)));
    }

    #[test]
    fn test_quantity_rounded_to_grams() {
        let tare = piece_sale();
        let out = resolve_weight(&input(&tare, dec!(1.23456), 1, dec!(10), dec!(5))).unwrap();
        assert_eq!(out.final_quantity.value(), dec!(1.235));
    }

    #[test]
    fn test_unit_price_keeps_full_precision() {
        let tare = piece_sale();
        let out = resolve_weight(&input(&tare, dec!(3), 1, dec!(33.3333), dec!(5))).unwrap();
        assert_eq!(out.unit_price.amount(), dec!(33.3333));
        assert_eq!(out.total_price.amount(), dec!(100.00));
    }

    #[test]
    fn test_total_equals_quantity_times_price_within_a_cent() {
        let tare = container(dec!(0.75));
        for (gross, boxes, price) in [
            (dec!(12.345), 3, dec!(17.99)),
            (dec!(80.5), 10, dec!(42.125)),
            (dec!(5.001), 1, dec!(0.01)),
        ] {
            let out = resolve_weight(&input(&tare, gross, boxes, price, dec!(1000))).unwrap();
            let exact = out.final_quantity.value() * out.unit_price.amount();
            assert!((out.total_price.amount() - exact).abs() <= dec!(0.01));
        }
    }

    #[test]
    fn test_idempotent() {
        let tare = container(dec!(2.5));
        let req = input(&tare, dec!(50.0), 4, dec!(10.00), dec!(100));
        assert_eq!(resolve_weight(&req), resolve_weight(&req));
    }
}
