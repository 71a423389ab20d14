//! # Report Repository
//!
//! Sales margin over completed orders. Line values are summed in Rust with
//! `Decimal`; SQLite would sum the TEXT columns as floats.

use bascula_core::report::{build_margin_report, MarginReport, MarginRow};
use bascula_core::Money;
use chrono::{DateTime, Days, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{kilograms_column, money_column, optional_money_column};

#[derive(Debug, FromRow)]
struct SoldLineRow {
    product_id: String,
    sku: String,
    name: String,
    cost_per_kg: Option<String>,
    quantity: String,
    line_total: String,
}

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Margin per product for orders completed between `from` and `to`,
    /// both days inclusive (UTC).
    pub async fn margin(&self, from: NaiveDate, to: NaiveDate) -> DbResult<MarginReport> {
        if to < from {
            return Err(DbError::invalid_data("report range", format!("{} is before {}", to, from)));
        }
        let start = day_start(from);
        let end = to
            .checked_add_days(Days::new(1))
            .map(day_start)
            .ok_or_else(|| DbError::invalid_data("report range", "end date out of range"))?;

        let rows: Vec<SoldLineRow> = sqlx::query_as(
            r#"
            SELECT ol.product_id, p.sku, p.name, p.cost_per_kg, ol.quantity, ol.line_total
            FROM order_lines ol
            JOIN orders o ON o.id = ol.order_id
            JOIN products p ON p.id = ol.product_id
            WHERE o.status = 'completed'
              AND o.completed_at >= ?1
              AND o.completed_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        debug!(from = %from, to = %to, lines = rows.len(), "Margin report query");

        let mut by_product: HashMap<String, MarginRow> = HashMap::new();
        for row in rows {
            let quantity = kilograms_column("order_lines.quantity", &row.quantity)?;
            let total = money_column("order_lines.line_total", &row.line_total)?;

            match by_product.get_mut(&row.product_id) {
                Some(acc) => {
                    acc.quantity_sold += quantity;
                    acc.revenue = acc.revenue + total;
                }
                None => {
                    let cost_per_kg = optional_money_column("products.cost_per_kg", row.cost_per_kg.as_deref())?;
                    by_product.insert(
                        row.product_id.clone(),
                        MarginRow {
                            product_id: row.product_id,
                            sku: row.sku,
                            name: row.name,
                            quantity_sold: quantity,
                            revenue: total,
                            cost_per_kg,
                        },
                    );
                }
            }
        }

        Ok(build_margin_report(by_product.into_values().collect()))
    }

    /// Revenue of completed orders on one day.
    pub async fn daily_revenue(&self, day: NaiveDate) -> DbResult<Money> {
        let report = self.margin(day, day).await?;
        Ok(report.total_revenue)
    }
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}
