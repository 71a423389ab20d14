//! Margin math for the sales report.
//!
//! The database layer aggregates sold quantity and revenue per product id;
//! this module turns those rows into cost, margin and margin percent.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Kilograms, Money};

/// Aggregated sales for one product, as returned by the report query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarginRow {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity_sold: Kilograms,
    pub revenue: Money,
    pub cost_per_kg: Option<Money>,
}

/// One product's margin.
///
/// `cost`, `margin` and `margin_percent` are `None` when the product has no
/// purchase cost recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MarginLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity_sold: Kilograms,
    pub revenue: Money,
    pub cost: Option<Money>,
    pub margin: Option<Money>,
    #[ts(type = "string | null")]
    pub margin_percent: Option<Decimal>,
}

/// Report body plus totals over the costed lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MarginReport {
    pub lines: Vec<MarginLine>,
    pub total_revenue: Money,
    pub total_cost: Money,
    pub total_margin: Money,
}

fn percent(part: Money, whole: Money) -> Option<Decimal> {
    if whole.is_zero() {
        return None;
    }
    let pct = part.amount() * Decimal::ONE_HUNDRED / whole.amount();
    Some(pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

impl From<MarginRow> for MarginLine {
    fn from(row: MarginRow) -> Self {
        let cost = row
            .cost_per_kg
            .map(|c| c.times(row.quantity_sold).rounded());
        let margin = cost.map(|c| row.revenue - c);
        let margin_percent = margin.and_then(|m| percent(m, row.revenue));

        MarginLine {
            product_id: row.product_id,
            sku: row.sku,
            name: row.name,
            quantity_sold: row.quantity_sold,
            revenue: row.revenue,
            cost,
            margin,
            margin_percent,
        }
    }
}

/// Builds the report, sorted by margin (highest first, uncosted last).
pub fn build_margin_report(rows: Vec<MarginRow>) -> MarginReport {
    let mut lines: Vec<MarginLine> = rows.into_iter().map(MarginLine::from).collect();
    lines.sort_by(|a, b| b.margin.cmp(&a.margin).then_with(|| a.name.cmp(&b.name)));

    let total_revenue = lines.iter().map(|l| l.revenue).sum();
    let total_cost = lines.iter().filter_map(|l| l.cost).sum();
    let total_margin = lines.iter().filter_map(|l| l.margin).sum();

    MarginReport {
        lines,
        total_revenue,
        total_cost,
        total_margin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(id: &str, qty: Decimal, revenue: Decimal, cost: Option<Decimal>) -> MarginRow {
        MarginRow {
            product_id: id.to_string(),
            sku: id.to_uppercase(),
            name: format!("Producto {}", id),
            quantity_sold: Kilograms::new(qty),
            revenue: Money::new(revenue),
            cost_per_kg: cost.map(Money::new),
        }
    }

    #[test]
    fn test_margin_line() {
        let line = MarginLine::from(row("a", dec!(12.5), dec!(375.00), Some(dec!(22))));
        assert_eq!(line.cost, Some(Money::new(dec!(275.00))));
        assert_eq!(line.margin, Some(Money::new(dec!(100.00))));
        assert_eq!(line.margin_percent, Some(dec!(26.67)));
    }

    #[test]
    fn test_uncosted_product_has_no_margin() {
        let line = MarginLine::from(row("a", dec!(1), dec!(10), None));
        assert_eq!(line.cost, None);
        assert_eq!(line.margin, None);
        assert_eq!(line.margin_percent, None);
    }

    #[test]
    fn test_zero_revenue_has_no_percent() {
        let line = MarginLine::from(row("a", dec!(1), dec!(0), Some(dec!(5))));
        assert_eq!(line.margin, Some(Money::new(dec!(-5.00))));
        assert_eq!(line.margin_percent, None);
    }

    #[test]
    fn test_report_totals_and_order() {
        // revenue order would be c, a, b; margin order is b, a, then uncosted c
        let report = build_margin_report(vec![
            row("a", dec!(10), dec!(300), Some(dec!(29))),
            row("b", dec!(10), dec!(200), Some(dec!(10))),
            row("c", dec!(1), dec!(500), None),
        ]);

        let ids: Vec<&str> = report.lines.iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(report.total_revenue.amount(), dec!(1000));
        assert_eq!(report.total_cost.amount(), dec!(390.00));
        assert_eq!(report.total_margin.amount(), dec!(110.00));
    }
}
