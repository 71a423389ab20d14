//! # Inventory Movements
//!
//! Stock changes and the authorization gate in front of them.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Movement Workflow                              │
//! │                                                                         │
//! │  kind ──► requires_authorization()?                                     │
//! │              │ no (entrada, salida)        │ yes (ajuste, merma)       │
//! │              │                             ▼                            │
//! │              │                 policy.check(principal, AdjustStock)    │
//! │              │                             │ denied → AuthorizationError│
//! │              ▼                             ▼                            │
//! │          apply_movement(current, kind, quantity)                        │
//! │              │                                                          │
//! │              ▼                                                          │
//! │        (delta, resulting_stock)  ──► persisted by bascula-db            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};
use ts_rs::TS;

use crate::auth::{AuthorizationPolicy, Capability, Principal};
use crate::error::{AuthorizationError, CoreError, CoreResult, ValidationError};
use crate::money::Kilograms;

/// Kind of inventory movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Goods received.
    Entrada,
    /// Goods leaving (sales).
    Salida,
    /// Signed correction after a physical count.
    Ajuste,
    /// Shrinkage: spoilage, dehydration, damage.
    Merma,
}

impl MovementKind {
    /// Ajuste and merma change stock without a matching document, so they
    /// go through the gate.
    pub fn requires_authorization(&self) -> bool {
        matches!(self, MovementKind::Ajuste | MovementKind::Merma)
    }
}

impl std::str::FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entrada" => Ok(MovementKind::Entrada),
            "salida" => Ok(MovementKind::Salida),
            "ajuste" => Ok(MovementKind::Ajuste),
            "merma" => Ok(MovementKind::Merma),
            other => Err(format!(
                "Unknown movement kind: '{}'. Valid options: entrada, salida, ajuste, merma",
                other
            )),
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementKind::Entrada => write!(f, "entrada"),
            MovementKind::Salida => write!(f, "salida"),
            MovementKind::Ajuste => write!(f, "ajuste"),
            MovementKind::Merma => write!(f, "merma"),
        }
    }
}

/// Result of applying a movement to a stock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    /// Signed change (negative for salida / merma).
    pub delta: Kilograms,
    /// Stock after the change, never negative.
    pub resulting_stock: Kilograms,
}

/// Runs the authorization gate for a movement.
///
/// Returns the name to record as `authorized_by`: the principal's name for
/// gated kinds, `None` for entrada/salida.
pub fn authorize_movement(
    policy: &dyn AuthorizationPolicy,
    principal: &Principal,
    kind: MovementKind,
) -> Result<Option<String>, AuthorizationError> {
    if !kind.requires_authorization() {
        return Ok(None);
    }

    if let Err(e) = policy.check(principal, Capability::AdjustStock) {
        warn!(principal = %principal.name, role = %principal.role, kind = %kind, "Stock movement denied");
        return Err(e);
    }

    Ok(Some(principal.name.clone()))
}

/// Applies a movement to the current stock.
///
/// `quantity` is rounded to 3 decimals first. It must be positive for
/// entrada, salida and merma; for ajuste it is a signed delta and only zero
/// is rejected.
///
/// ## Example
/// ```rust
/// use bascula_core::inventory::{apply_movement, MovementKind};
/// use bascula_core::money::Kilograms;
/// use rust_decimal::Decimal;
///
/// let change = apply_movement(
///     "Jitomate",
///     Kilograms::new(Decimal::new(50, 0)),
///     MovementKind::Merma,
///     Kilograms::new(Decimal::new(25, 1)),
/// )
/// .unwrap();
/// assert_eq!(change.resulting_stock.value(), Decimal::new(475, 1));
/// ```
pub fn apply_movement(
    product: &str,
    current: Kilograms,
    kind: MovementKind,
    quantity: Kilograms,
) -> CoreResult<StockChange> {
    let quantity = quantity.rounded();

    if quantity.is_zero() {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }

    let delta = match kind {
        MovementKind::Ajuste => quantity,
        MovementKind::Entrada | MovementKind::Salida | MovementKind::Merma => {
            if quantity.is_negative() {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }
                .into());
            }
            if kind == MovementKind::Entrada {
                quantity
            } else {
                -quantity
            }
        }
    };

    let resulting_stock = current + delta;
    if resulting_stock.is_negative() {
        return Err(CoreError::InsufficientStock {
            product: product.to_string(),
            available: current,
            requested: -delta,
        });
    }

    debug!(product, kind = %kind, delta = %delta, resulting = %resulting_stock, "Movement applied");

    Ok(StockChange {
        delta,
        resulting_stock,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, RolePolicy};
    use rust_decimal_macros::dec;

    fn kg(v: rust_decimal::Decimal) -> Kilograms {
        Kilograms::new(v)
    }

    #[test]
    fn test_entrada_and_salida_bypass_gate() {
        let cashier = Principal::new("caro", Role::Cashier);
        assert_eq!(authorize_movement(&RolePolicy, &cashier, MovementKind::Entrada).unwrap(), None);
        assert_eq!(authorize_movement(&RolePolicy, &cashier, MovementKind::Salida).unwrap(), None);
    }

    #[test]
    fn test_ajuste_and_merma_require_capability() {
        let cashier = Principal::new("caro", Role::Cashier);
        let supervisor = Principal::new("beto", Role::Supervisor);

        assert!(authorize_movement(&RolePolicy, &cashier, MovementKind::Ajuste).is_err());
        assert!(authorize_movement(&RolePolicy, &cashier, MovementKind::Merma).is_err());
        assert_eq!(
            authorize_movement(&RolePolicy, &supervisor, MovementKind::Merma).unwrap(),
            Some("beto".to_string())
        );
    }

    #[test]
    fn test_custom_policy_is_honored() {
        struct DenyAll;
        impl AuthorizationPolicy for DenyAll {
            fn check(&self, p: &Principal, c: Capability) -> Result<(), AuthorizationError> {
                Err(AuthorizationError::Denied {
                    principal: p.name.clone(),
                    capability: c,
                })
            }
        }

        let admin = Principal::new("ana", Role::Admin);
        assert!(authorize_movement(&DenyAll, &admin, MovementKind::Ajuste).is_err());
        assert!(authorize_movement(&DenyAll, &admin, MovementKind::Entrada).is_ok());
    }

    #[test]
    fn test_entrada_adds_stock() {
        let change = apply_movement("x", kg(dec!(10)), MovementKind::Entrada, kg(dec!(2.5))).unwrap();
        assert_eq!(change.delta.value(), dec!(2.5));
        assert_eq!(change.resulting_stock.value(), dec!(12.5));
    }

    #[test]
    fn test_salida_cannot_go_negative() {
        let err = apply_movement("Aguacate", kg(dec!(1)), MovementKind::Salida, kg(dec!(1.001))).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));

        let change = apply_movement("Aguacate", kg(dec!(1)), MovementKind::Salida, kg(dec!(1))).unwrap();
        assert!(change.resulting_stock.is_zero());
    }

    #[test]
    fn test_ajuste_is_signed() {
        let down = apply_movement("x", kg(dec!(5)), MovementKind::Ajuste, kg(dec!(-2))).unwrap();
        assert_eq!(down.resulting_stock.value(), dec!(3));

        let up = apply_movement("x", kg(dec!(5)), MovementKind::Ajuste, kg(dec!(0.75))).unwrap();
        assert_eq!(up.resulting_stock.value(), dec!(5.75));

        assert!(apply_movement("x", kg(dec!(5)), MovementKind::Ajuste, kg(dec!(-6))).is_err());
    }

    #[test]
    fn test_zero_and_negative_quantities_rejected() {
        assert!(apply_movement("x", kg(dec!(5)), MovementKind::Ajuste, kg(dec!(0))).is_err());
        assert!(apply_movement("x", kg(dec!(5)), MovementKind::Entrada, kg(dec!(0.0004))).is_err());
        assert!(apply_movement("x", kg(dec!(5)), MovementKind::Merma, kg(dec!(-1))).is_err());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("MERMA".parse::<MovementKind>().unwrap(), MovementKind::Merma);
        assert!("robo".parse::<MovementKind>().is_err());
    }
}
