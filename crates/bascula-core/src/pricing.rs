//! # Price Tiers
//!
//! Every product carries up to five per-kilogram prices ("tiers"). A client
//! is assigned a default tier; the cashier may override it for one sale.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Price Per Kg Resolution                             │
//! │                                                                         │
//! │  override tier? ──yes──► that tier                                     │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  client default tier? ──yes──► that tier                               │
//! │       │ no (walk-in)                                                    │
//! │       ▼                                                                 │
//! │  tier 1                                                                 │
//! │                                                                         │
//! │  Selected tier has no price? → fall back to tier 1 (always present)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

/// Highest tier index a product can carry.
pub const MAX_PRICE_TIER: u8 = 5;

// =============================================================================
// Price Tier
// =============================================================================

/// A price level, 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "u8", into = "u8")]
#[ts(export)]
pub struct PriceTier(u8);

impl PriceTier {
    /// The base tier every product must price.
    pub const BASE: PriceTier = PriceTier(1);

    /// Creates a tier, rejecting indices outside 1..=5.
    pub fn new(index: u8) -> Result<Self, ValidationError> {
        if index == 0 || index > MAX_PRICE_TIER {
            return Err(ValidationError::OutOfRange {
                field: "price tier".to_string(),
                min: 1,
                max: MAX_PRICE_TIER as i64,
            });
        }
        Ok(PriceTier(index))
    }

    /// Returns the tier index (1-based).
    #[inline]
    pub const fn index(&self) -> u8 {
        self.0
    }

    /// Iterates all valid tiers in order.
    pub fn all() -> impl Iterator<Item = PriceTier> {
        (1..=MAX_PRICE_TIER).map(PriceTier)
    }
}

impl Default for PriceTier {
    fn default() -> Self {
        PriceTier::BASE
    }
}

impl TryFrom<u8> for PriceTier {
    type Error = ValidationError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        PriceTier::new(index)
    }
}

impl From<PriceTier> for u8 {
    fn from(tier: PriceTier) -> u8 {
        tier.0
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

// =============================================================================
// Price Tier Set
// =============================================================================

/// One tier's price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TierPrice {
    pub tier: PriceTier,
    pub price: Money,
}

/// A product's per-kilogram prices by tier.
///
/// ## Invariants
/// - Tier 1 is always present
/// - At most one price per tier, kept sorted by tier
/// - No negative prices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TierPrice>", into = "Vec<TierPrice>")]
pub struct PriceTierSet {
    entries: Vec<TierPrice>,
}

impl PriceTierSet {
    /// Creates a set with only the base price.
    pub fn new(base_price: Money) -> Result<Self, ValidationError> {
        Self::from_entries(vec![TierPrice {
            tier: PriceTier::BASE,
            price: base_price,
        }])
    }

    /// Builds a set from loose entries (e.g. database rows).
    ///
    /// Later entries for the same tier replace earlier ones.
    pub fn from_entries(entries: Vec<TierPrice>) -> Result<Self, ValidationError> {
        let mut set = PriceTierSet {
            entries: Vec::with_capacity(entries.len()),
        };
        for entry in entries {
            set.insert(entry.tier, entry.price)?;
        }
        if set.get(PriceTier::BASE).is_none() {
            return Err(ValidationError::Required {
                field: "tier 1 price".to_string(),
            });
        }
        Ok(set)
    }

    fn insert(&mut self, tier: PriceTier, price: Money) -> Result<(), ValidationError> {
        if price.is_negative() {
            return Err(ValidationError::Negative {
                field: format!("{} price", tier),
            });
        }
        match self.entries.binary_search_by_key(&tier, |e| e.tier) {
            Ok(pos) => self.entries[pos].price = price,
            Err(pos) => self.entries.insert(pos, TierPrice { tier, price }),
        }
        Ok(())
    }

    /// Sets or replaces the price for a tier.
    pub fn set(&mut self, tier: PriceTier, price: Money) -> Result<(), ValidationError> {
        self.insert(tier, price)
    }

    /// Removes a tier's price. Tier 1 cannot be removed.
    pub fn clear(&mut self, tier: PriceTier) -> Result<(), ValidationError> {
        if tier == PriceTier::BASE {
            return Err(ValidationError::Required {
                field: "tier 1 price".to_string(),
            });
        }
        self.entries.retain(|e| e.tier != tier);
        Ok(())
    }

    /// Returns the price for a tier, if set.
    pub fn get(&self, tier: PriceTier) -> Option<Money> {
        self.entries
            .iter()
            .find(|e| e.tier == tier)
            .map(|e| e.price)
    }

    /// Returns the tier 1 price.
    pub fn base_price(&self) -> Money {
        // from_entries and clear() keep tier 1 populated
        self.get(PriceTier::BASE).unwrap_or_default()
    }

    /// All entries, sorted by tier.
    pub fn entries(&self) -> &[TierPrice] {
        &self.entries
    }
}

impl TryFrom<Vec<TierPrice>> for PriceTierSet {
    type Error = ValidationError;

    fn try_from(entries: Vec<TierPrice>) -> Result<Self, Self::Error> {
        PriceTierSet::from_entries(entries)
    }
}

impl From<PriceTierSet> for Vec<TierPrice> {
    fn from(set: PriceTierSet) -> Self {
        set.entries
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Picks the tier that applies to a sale.
pub fn select_tier(client_default: Option<PriceTier>, override_tier: Option<PriceTier>) -> PriceTier {
    override_tier.or(client_default).unwrap_or(PriceTier::BASE)
}

/// Resolves the per-kilogram price fed to the tare calculator.
///
/// ## Example
/// ```rust
/// use bascula_core::money::Money;
/// use bascula_core::pricing::{resolve_price_per_kg, PriceTier, PriceTierSet};
/// use rust_decimal::Decimal;
///
/// let mut prices = PriceTierSet::new(Money::new(Decimal::new(100, 0))).unwrap();
/// prices.set(PriceTier::new(3).unwrap(), Money::new(Decimal::new(90, 0))).unwrap();
///
/// let wholesale = resolve_price_per_kg(&prices, PriceTier::new(3).ok(), None);
/// assert_eq!(wholesale.amount(), Decimal::new(90, 0));
/// ```
pub fn resolve_price_per_kg(
    prices: &PriceTierSet,
    client_default: Option<PriceTier>,
    override_tier: Option<PriceTier>,
) -> Money {
    resolve_tier_price(prices, client_default, override_tier).price
}

/// Like [`resolve_price_per_kg`], but also reports the tier whose price was
/// used (tier 1 after a fallback).
pub fn resolve_tier_price(
    prices: &PriceTierSet,
    client_default: Option<PriceTier>,
    override_tier: Option<PriceTier>,
) -> TierPrice {
    let tier = select_tier(client_default, override_tier);
    match prices.get(tier) {
        Some(price) => TierPrice { tier, price },
        None => {
            debug!(tier = %tier, "Tier has no price, falling back to tier 1");
            TierPrice {
                tier: PriceTier::BASE,
                price: prices.base_price(),
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tier(i: u8) -> PriceTier {
        PriceTier::new(i).unwrap()
    }

    fn sample_prices() -> PriceTierSet {
        PriceTierSet::from_entries(vec![
            TierPrice { tier: tier(1), price: Money::new(dec!(30.00)) },
            TierPrice { tier: tier(2), price: Money::new(dec!(28.50)) },
            TierPrice { tier: tier(4), price: Money::new(dec!(25.00)) },
        ])
        .unwrap()
    }

    #[test]
    fn test_tier_range() {
        assert!(PriceTier::new(0).is_err());
        assert!(PriceTier::new(1).is_ok());
        assert!(PriceTier::new(5).is_ok());
        assert!(PriceTier::new(6).is_err());
        assert_eq!(PriceTier::all().count(), 5);
    }

    #[test]
    fn test_tier_one_is_required() {
        let result = PriceTierSet::from_entries(vec![TierPrice {
            tier: tier(2),
            price: Money::new(dec!(10)),
        }]);
        assert!(matches!(result, Err(ValidationError::Required { .. })));

        let mut prices = sample_prices();
        assert!(prices.clear(PriceTier::BASE).is_err());
        assert!(prices.clear(tier(2)).is_ok());
        assert_eq!(prices.get(tier(2)), None);
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut prices = sample_prices();
        assert!(prices.set(tier(3), Money::new(dec!(-1))).is_err());
    }

    #[test]
    fn test_entries_sorted_and_deduplicated() {
        let prices = PriceTierSet::from_entries(vec![
            TierPrice { tier: tier(3), price: Money::new(dec!(9)) },
            TierPrice { tier: tier(1), price: Money::new(dec!(10)) },
            TierPrice { tier: tier(3), price: Money::new(dec!(8)) },
        ])
        .unwrap();
        let tiers: Vec<u8> = prices.entries().iter().map(|e| e.tier.index()).collect();
        assert_eq!(tiers, vec![1, 3]);
        assert_eq!(prices.get(tier(3)), Some(Money::new(dec!(8))));
    }

    #[test]
    fn test_override_beats_client_default() {
        let prices = sample_prices();
        let price = resolve_price_per_kg(&prices, Some(tier(2)), Some(tier(4)));
        assert_eq!(price.amount(), dec!(25.00));
    }

    #[test]
    fn test_client_default_used_without_override() {
        let prices = sample_prices();
        let price = resolve_price_per_kg(&prices, Some(tier(2)), None);
        assert_eq!(price.amount(), dec!(28.50));
    }

    #[test]
    fn test_walk_in_uses_tier_one() {
        let prices = sample_prices();
        assert_eq!(resolve_price_per_kg(&prices, None, None).amount(), dec!(30.00));
    }

    #[test]
    fn test_missing_tier_falls_back_to_base() {
        let prices = sample_prices();
        assert_eq!(resolve_price_per_kg(&prices, Some(tier(5)), None).amount(), dec!(30.00));
    }

    #[test]
    fn test_resolved_tier_reports_fallback() {
        let applied = resolve_tier_price(&sample_prices(), Some(tier(2)), None);
        assert_eq!(applied.tier, tier(2));
        assert_eq!(applied.price.amount(), dec!(28.50));

        let applied = resolve_tier_price(&sample_prices(), None, Some(tier(3)));
        assert_eq!(applied.tier, PriceTier::BASE);
        assert_eq!(applied.price.amount(), dec!(30.00));
    }

    #[test]
    fn test_serde_rejects_missing_base_tier() {
        let json = r#"[{"tier":2,"price":"10.00"}]"#;
        assert!(serde_json::from_str::<PriceTierSet>(json).is_err());

        let json = r#"[{"tier":1,"price":"10.00"}]"#;
        let prices: PriceTierSet = serde_json::from_str(json).unwrap();
        assert_eq!(prices.base_price().amount(), dec!(10.00));
    }
}
