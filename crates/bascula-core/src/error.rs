//! # Error Types
//!
//! Domain-specific error types for bascula-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bascula-core errors (this file)                                       │
//! │  ├── WeighError         - Tare calculator failures                     │
//! │  ├── AuthorizationError - Stock gate denials                           │
//! │  ├── CoreError          - General domain errors                        │
//! │  └── ValidationError    - Input validation failures                    │
//! │                                                                         │
//! │  bascula-db errors (separate crate)                                    │
//! │  └── DbError            - Database operation failures                  │
//! │                                                                         │
//! │  App errors (apps/pos)                                                 │
//! │  └── ApiError           - What the operator sees (serialized)          │
//! │                                                                         │
//! │  Flow: ValidationError → WeighError → CoreError → ApiError → Operator  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant here is recoverable: the operator corrects the input and the
//! operation is retried. Nothing in this crate aborts a session.

use thiserror::Error;

use crate::auth::Capability;
use crate::money::Kilograms;

// =============================================================================
// Weigh Error
// =============================================================================

/// Failures of the tare resolution calculator.
///
/// ## User Workflow
/// ```text
/// Operator picks tare, enters gross weight and boxes
///      │
///      ▼
/// resolve_weight()
///      │
///      ├── no tare picked       → NoTareSelected
///      ├── gross ≤ tare total   → NegativeNetWeight
///      ├── net > stock          → InsufficientStock
///      └── quantity ≤ 0         → InvalidQuantity
///      │
///      ▼
/// UI shows the message, operator fixes the field, tries again
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeighError {
    /// The operator has not picked a tare yet.
    #[error("No tare selected")]
    NoTareSelected,

    /// The weight/quantity for the active mode is zero or negative.
    #[error("Invalid quantity: {quantity} kg")]
    InvalidQuantity { quantity: Kilograms },

    /// Gross weight does not exceed the total container weight.
    #[error("Net weight must be positive: gross {gross} kg - tare {tare_total} kg = {net} kg")]
    NegativeNetWeight {
        gross: Kilograms,
        tare_total: Kilograms,
        net: Kilograms,
    },

    /// Resolved quantity exceeds available stock.
    #[error("Insufficient stock: requested {requested} kg, available {available} kg")]
    InsufficientStock {
        requested: Kilograms,
        available: Kilograms,
    },

    /// Input rejected before the calculation ran.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result alias for the calculator.
pub type WeighResult<T> = Result<T, WeighError>;

// =============================================================================
// Authorization Error
// =============================================================================

/// The stock gate refused an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    /// Principal's role lacks the capability.
    #[error("{principal} is not allowed to {capability}")]
    Denied {
        principal: String,
        capability: Capability,
    },
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Calculator failure while building an order line.
    #[error(transparent)]
    Weigh(#[from] WeighError),

    /// Stock gate denial.
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    /// A stock movement would leave the product below zero.
    #[error("Insufficient stock for {product}: available {available} kg, requested {requested} kg")]
    InsufficientStock {
        product: String,
        available: Kilograms,
        requested: Kilograms,
    },

    /// Order draft has reached its line limit.
    #[error("Order cannot have more than {max} lines")]
    OrderTooLarge { max: usize },

    /// Order line id not present in the draft.
    #[error("Order line not found: {0}")]
    LineNotFound(String),

    /// Tried to commit a draft with no lines.
    #[error("Order has no lines")]
    EmptyOrder,

    /// The piece-sale tare is managed by the system.
    #[error("The piece-sale tare cannot be modified")]
    ReservedTare,

    /// Product has no price for any tier usable here.
    #[error("Product {0} has no base price")]
    MissingBasePrice(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator input doesn't meet requirements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Integer value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, unparsable decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is beyond what the arithmetic can represent.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Value is reserved by the system.
    #[error("{field} '{value}' is reserved")]
    Reserved { field: String, value: String },
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_stock_message_has_both_amounts() {
        let err = WeighError::InsufficientStock {
            requested: Kilograms::new(dec!(119.000)),
            available: Kilograms::new(dec!(100)),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock: requested 119.000 kg, available 100 kg"
        );
    }

    #[test]
    fn test_negative_net_weight_message() {
        let err = WeighError::NegativeNetWeight {
            gross: Kilograms::new(dec!(10.0)),
            tare_total: Kilograms::new(dec!(10.0)),
            net: Kilograms::new(dec!(0.0)),
        };
        assert_eq!(
            err.to_string(),
            "Net weight must be positive: gross 10.0 kg - tare 10.0 kg = 0.0 kg"
        );
    }

    #[test]
    fn test_validation_converts_to_weigh_and_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let weigh_err: WeighError = validation_err.clone().into();
        assert!(matches!(weigh_err, WeighError::Validation(_)));

        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_weigh_error_is_transparent_in_core_error() {
        let core_err: CoreError = WeighError::NoTareSelected.into();
        assert_eq!(core_err.to_string(), "No tare selected");
    }
}
