//! Margin report command.

use bascula_core::report::MarginReport;
use chrono::NaiveDate;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Margin per product for orders completed from `from` through `to` (UTC).
pub async fn margin_report(state: &AppState, from: NaiveDate, to: NaiveDate) -> ApiResult<MarginReport> {
    if to < from {
        return Err(ApiError::validation(format!("Report range ends ({}) before it starts ({})", to, from)));
    }
    Ok(state.db().reports().margin(from, to).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::order::commit;
    use crate::commands::test_support::{product, state_as};
    use crate::commands::weighing::{weigh, WeighRequest};
    use crate::error::ErrorCode;
    use bascula_core::{Kilograms, Role, PIECE_SALE_TARE_NAME};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_report_after_commit() {
        let state = state_as(Role::Cashier).await;
        product(&state, "JIT", dec!(10), dec!(20)).await;
        weigh(
            &state,
            WeighRequest {
                product: "JIT".to_string(),
                tare: Some(PIECE_SALE_TARE_NAME.to_string()),
                gross_weight: Kilograms::new(dec!(4)),
                box_count: 1,
            },
        )
        .await
        .unwrap();
        commit(&state).await.unwrap();

        let today = Utc::now().date_naive();
        let report = margin_report(&state, today, today).await.unwrap();
        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.total_revenue.amount(), dec!(40.00));
        assert_eq!(report.total_cost.amount(), dec!(20.00));
        assert_eq!(report.lines[0].margin_percent, Some(dec!(50.00)));
    }

    #[tokio::test]
    async fn test_inverted_range() {
        let state = state_as(Role::Cashier).await;
        let today = Utc::now().date_naive();
        let err = margin_report(&state, today, today.pred_opt().unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
