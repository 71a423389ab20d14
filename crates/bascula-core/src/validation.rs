//! # Validation Module
//!
//! Input validation utilities for Báscula.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Operator input (CLI / UI)                                    │
//! │  ├── Parsing (decimals, integers)                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE: business rule validation                        │
//! │  ├── names, weights, prices, box counts, tiers                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / CHECK / FOREIGN KEY constraints               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::{Kilograms, Money};
use crate::{MAX_BOX_COUNT, PIECE_SALE_TARE_NAME};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates a tare name for the catalog.
///
/// ## Rules
/// - Must not be empty
/// - At most 60 characters
/// - Must not collide with the reserved piece-sale name
///
/// ## Returns
/// The trimmed name.
///
/// ## Example
/// ```rust
/// use bascula_core::validation::validate_tare_name;
///
/// assert_eq!(validate_tare_name("  Reja madera ").unwrap(), "Reja madera");
/// assert!(validate_tare_name("").is_err());
/// assert!(validate_tare_name("NO_TARE_PIECE_SALE").is_err());
/// ```
pub fn validate_tare_name(name: &str) -> ValidationResult<String> {
    let name = validate_name("tare name", name, 60)?;

    if name.eq_ignore_ascii_case(PIECE_SALE_TARE_NAME) {
        return Err(ValidationError::Reserved {
            field: "tare name".to_string(),
            value: name,
        });
    }

    Ok(name)
}

/// Validates a product name (1..=200 characters). Returns it trimmed.
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    validate_name("name", name, 200)
}

/// Validates a client name (1..=200 characters). Returns it trimmed.
pub fn validate_client_name(name: &str) -> ValidationResult<String> {
    validate_name("client name", name, 200)
}

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
pub fn validate_sku(sku: &str) -> ValidationResult<String> {
    let sku = validate_name("sku", sku, 50)?;

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(sku)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a box count for container mode (1..=999).
pub fn validate_box_count(count: u32) -> ValidationResult<()> {
    if count == 0 || count > MAX_BOX_COUNT {
        return Err(ValidationError::OutOfRange {
            field: "box count".to_string(),
            min: 1,
            max: MAX_BOX_COUNT as i64,
        });
    }
    Ok(())
}

/// Validates a non-negative weight (tare unit weight, stock level).
pub fn validate_weight(field: &str, weight: Kilograms) -> ValidationResult<()> {
    if weight.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a non-negative price. Zero is allowed (giveaways).
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Parses a decimal typed by the operator or read from storage.
///
/// Accepts `12`, `12.5`, ` 12.500 `. Rejects empty strings, commas and
/// scientific notation.
///
/// ## Example
/// ```rust
/// use bascula_core::validation::parse_decimal;
///
/// assert_eq!(parse_decimal("gross", " 3.250 ").unwrap().to_string(), "3.250");
/// assert!(parse_decimal("gross", "3,250").is_err());
/// ```
pub fn parse_decimal(field: &str, raw: &str) -> ValidationResult<Decimal> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Decimal::from_str(raw).map_err(|e| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_tare_name() {
        assert_eq!(validate_tare_name("Caja plástica").unwrap(), "Caja plástica");
        assert!(validate_tare_name("   ").is_err());
        assert!(validate_tare_name(&"x".repeat(61)).is_err());
        assert!(matches!(
            validate_tare_name("no_tare_piece_sale"),
            Err(ValidationError::Reserved { .. })
        ));
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("TOM-SAL-01").is_ok());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku("").is_err());
    }

    #[test]
    fn test_validate_box_count() {
        assert!(validate_box_count(0).is_err());
        assert!(validate_box_count(1).is_ok());
        assert!(validate_box_count(999).is_ok());
        assert!(validate_box_count(1000).is_err());
    }

    #[test]
    fn test_validate_weight_and_price() {
        assert!(validate_weight("w", Kilograms::zero()).is_ok());
        assert!(validate_weight("w", Kilograms::new(dec!(-0.001))).is_err());
        assert!(validate_price("p", Money::zero()).is_ok());
        assert!(validate_price("p", Money::new(dec!(-1))).is_err());
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("x", "12").unwrap(), dec!(12));
        assert_eq!(parse_decimal("x", "-0.5").unwrap(), dec!(-0.5));
        assert!(parse_decimal("x", "").is_err());
        assert!(parse_decimal("x", "abc").is_err());
    }
}
