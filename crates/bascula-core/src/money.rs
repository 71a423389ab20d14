//! # Money & Weight Module
//!
//! Provides the `Money` and `Kilograms` types for handling prices and
//! weighed quantities safely.
//!
//! ## Why Decimal?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    50.0 - 2.5 × 4 = 40.00000000000001  ❌ WRONG!                        │
//! │    10.0 - 5.0 × 2 = 1.7e-15 (not zero) → "positive" net weight          │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal                                             │
//! │    Exact base-10 arithmetic. Rounding happens only at the points       │
//! │    where the business says so:                                          │
//! │      • quantity   → 3 decimals (grams)                                  │
//! │      • line total → 2 decimals (centavos, display)                      │
//! │      • unit price → never rounded                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bascula_core::money::{Kilograms, Money};
//! use rust_decimal::Decimal;
//!
//! let price = Money::new(Decimal::new(2500, 2));    // $25.00 / kg
//! let qty = Kilograms::new(Decimal::new(3250, 3));   // 3.250 kg
//!
//! let total = price.times(qty).rounded();
//! assert_eq!(total.to_string(), "$81.25");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Decimal places kept for weights and sellable quantities (grams).
pub const WEIGHT_DECIMALS: u32 = 3;

/// Decimal places for displayed currency amounts (centavos).
pub const CURRENCY_DECIMALS: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in pesos.
///
/// ## Design Decisions
/// - **Decimal (signed)**: negative values for shrinkage write-offs and
///   refunds
/// - **Full precision**: unit prices are stored exactly as entered, only
///   line totals are rounded for display
///
/// ## Where Money is Used
/// ```text
/// PriceTierSet[tier] ──► pricePerKg ──► unit_price (full precision)
///                                              │
///                              × final_quantity│
///                                              ▼
///                                   total_price (rounded 2dp)
///                                              │
///                                              ▼
///                                   OrderDraft::subtotal()
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is strictly greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is strictly less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Rounds to centavos, half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use bascula_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let m = Money::new(Decimal::new(12345, 3)); // 12.345
    /// assert_eq!(m.rounded().amount(), Decimal::new(1235, 2));
    /// ```
    pub fn rounded(&self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(CURRENCY_DECIMALS, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiplies a per-kilogram price by a quantity. Not rounded.
    ///
    /// ## User Workflow
    /// ```text
    /// Price: $10.00 / kg
    /// Quantity: 40.000 kg
    ///      │
    ///      ▼
    /// times(40.000) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// $400.00000 → rounded() → $400.00
    /// ```
    #[inline]
    pub fn times(&self, quantity: Kilograms) -> Money {
        Money(self.0 * quantity.value())
    }

    /// [`Money::times`], or `None` when the product does not fit a decimal.
    #[inline]
    pub fn checked_times(&self, quantity: Kilograms) -> Option<Money> {
        self.0.checked_mul(quantity.value()).map(Money)
    }
}

/// Shows the amount rounded to centavos: `$81.25`, `-$5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded().0;
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "{}${:.2}", sign, rounded.abs())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Kilograms Type
// =============================================================================

/// A weight or weighed quantity in kilograms.
///
/// Stock levels, tare weights, gross/net weights and order quantities all use
/// this type, so a weight can never be added to a price by mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Kilograms(#[ts(type = "string")] Decimal);

impl Kilograms {
    /// Wraps a decimal weight.
    #[inline]
    pub const fn new(value: Decimal) -> Self {
        Kilograms(value)
    }

    /// Returns the underlying decimal weight.
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Zero kilograms.
    #[inline]
    pub const fn zero() -> Self {
        Kilograms(Decimal::ZERO)
    }

    /// Checks if the weight is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the weight is strictly greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the weight is strictly less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Unit weight × box count, or `None` on overflow.
    #[inline]
    pub fn checked_times(&self, count: u32) -> Option<Kilograms> {
        self.0.checked_mul(Decimal::from(count)).map(Kilograms)
    }

    /// `self - other`, or `None` on overflow.
    #[inline]
    pub fn checked_sub(&self, other: Kilograms) -> Option<Kilograms> {
        self.0.checked_sub(other.0).map(Kilograms)
    }

    /// Rounds to grams (3 decimals), half away from zero.
    ///
    /// Only call this on a final value. Rounding the operands of a
    /// subtraction can turn a tiny positive net weight into zero.
    pub fn rounded(&self) -> Self {
        Kilograms(
            self.0
                .round_dp_with_strategy(WEIGHT_DECIMALS, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl fmt::Display for Kilograms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for Kilograms {
    fn default() -> Self {
        Kilograms::zero()
    }
}

impl Add for Kilograms {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Kilograms(self.0 + other.0)
    }
}

impl AddAssign for Kilograms {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Kilograms {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Kilograms(self.0 - other.0)
    }
}

impl Neg for Kilograms {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Kilograms(-self.0)
    }
}

impl Sum for Kilograms {
    fn sum<I: Iterator<Item = Kilograms>>(iter: I) -> Self {
        iter.fold(Kilograms::zero(), |acc, k| acc + k)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display() {
        assert_eq!(Money::new(dec!(10.99)).to_string(), "$10.99");
        assert_eq!(Money::new(dec!(5)).to_string(), "$5.00");
        assert_eq!(Money::new(dec!(-5.5)).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
        assert_eq!(Money::new(dec!(81.245)).to_string(), "$81.25");
    }

    #[test]
    fn test_money_rounding_half_away_from_zero() {
        assert_eq!(Money::new(dec!(0.125)).rounded().amount(), dec!(0.13));
        assert_eq!(Money::new(dec!(-0.125)).rounded().amount(), dec!(-0.13));
        assert_eq!(Money::new(dec!(0.124)).rounded().amount(), dec!(0.12));
    }

    #[test]
    fn test_weight_rounding_to_grams() {
        assert_eq!(Kilograms::new(dec!(3.2505)).rounded().value(), dec!(3.251));
        assert_eq!(Kilograms::new(dec!(3.2504)).rounded().value(), dec!(3.250));
        assert_eq!(Kilograms::new(dec!(0.0004)).rounded().value(), dec!(0));
    }

    #[test]
    fn test_times_keeps_full_precision() {
        let price = Money::new(dec!(12.3456));
        let line = price.times(Kilograms::new(dec!(2.000)));
        assert_eq!(line.amount(), dec!(24.6912));
        assert_eq!(line.rounded().amount(), dec!(24.69));
    }

    #[test]
    fn test_box_multiplication_is_exact() {
        let tare = Kilograms::new(dec!(2.5)).checked_times(4).unwrap();
        assert_eq!(tare.value(), dec!(10.0));

        // 0.1 × 3 is exactly 0.3 in decimal
        let three = Kilograms::new(dec!(0.1)).checked_times(3).unwrap();
        let net = Kilograms::new(dec!(0.3)).checked_sub(three).unwrap();
        assert!(net.is_zero());
    }

    #[test]
    fn test_checked_arithmetic_overflow() {
        assert_eq!(Kilograms::new(Decimal::MAX).checked_times(2), None);
        assert_eq!(Kilograms::new(Decimal::MIN).checked_sub(Kilograms::new(dec!(1))), None);
        assert_eq!(Money::new(Decimal::MAX).checked_times(Kilograms::new(dec!(1.5))), None);
        assert_eq!(
            Money::new(dec!(10)).checked_times(Kilograms::new(dec!(2))),
            Some(Money::new(dec!(20)))
        );
    }

    #[test]
    fn test_sums() {
        let total: Money = [dec!(1.10), dec!(2.20), dec!(3.30)]
            .into_iter()
            .map(Money::new)
            .sum();
        assert_eq!(total.amount(), dec!(6.60));

        let weight: Kilograms = [dec!(1.5), dec!(2.25)]
            .into_iter()
            .map(Kilograms::new)
            .sum();
        assert_eq!(weight.value(), dec!(3.75));
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::new(dec!(1)).is_positive());
        assert!(Money::new(dec!(-1)).is_negative());
        assert!(Kilograms::new(dec!(-0.001)).is_negative());
        assert!(!Kilograms::zero().is_positive());
        assert_eq!((-Kilograms::new(dec!(2))).value(), dec!(-2));
    }
}
