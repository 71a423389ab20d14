//! # Commands
//!
//! Operations the shell exposes. Every command takes `&AppState`, returns
//! `ApiResult<T>` with a serializable `T`, and publishes an [`AppEvent`]
//! after a successful change.
//!
//! ```text
//! commands/
//! ├── tare.rs       ◄─── tare catalog (list, add, edit, remove)
//! ├── catalog.rs    ◄─── products, price tiers, clients
//! ├── weighing.rs   ◄─── weigh / preview a line
//! ├── order.rs      ◄─── draft view, client/tier, remove line, commit, cancel
//! ├── inventory.rs  ◄─── gated stock movements, history
//! └── report.rs     ◄─── margin report
//! ```
//!
//! [`AppEvent`]: crate::events::AppEvent

pub mod catalog;
pub mod inventory;
pub mod order;
pub mod report;
pub mod tare;
pub mod weighing;

use bascula_core::Capability;

use crate::error::ApiResult;
use crate::state::AppState;

/// Runs the configured policy for the current operator.
pub(crate) fn require(state: &AppState, capability: Capability) -> ApiResult<()> {
    state.policy.check(&state.principal(), capability)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use bascula_core::pricing::PriceTierSet;
    use bascula_core::{Kilograms, Money, PriceTier, Product, Role};
    use bascula_db::NewProduct;
    use rust_decimal::Decimal;

    use crate::state::{AppConfig, AppState};

    pub async fn state_as(role: Role) -> AppState {
        let config = AppConfig {
            operator: format!("{}-1", role),
            role,
            ..AppConfig::default()
        };
        AppState::in_memory(config).await.unwrap()
    }

    /// Priced at `p1` (tier 1) and `p1 - 1` (tier 2).
    pub async fn product(state: &AppState, sku: &str, p1: Decimal, stock: Decimal) -> Product {
        let mut prices = PriceTierSet::new(Money::new(p1)).unwrap();
        prices
            .set(PriceTier::new(2).unwrap(), Money::new(p1 - Decimal::ONE))
            .unwrap();

        state
            .db()
            .products()
            .insert(NewProduct {
                sku: sku.to_string(),
                name: format!("Producto {}", sku),
                cost_per_kg: Some(Money::new(p1 / Decimal::TWO)),
                initial_stock: Kilograms::new(stock),
                prices,
            })
            .await
            .unwrap()
    }
}
