//! # Catalog Commands
//!
//! Products with their price tiers, and clients.

use bascula_core::{Capability, Client, Money, PriceTier, Product};
use bascula_db::{NewClient, NewProduct};
use tracing::debug;

use super::require;
use crate::error::{ApiError, ApiResult};
use crate::events::AppEvent;
use crate::state::AppState;

pub async fn list_products(state: &AppState) -> ApiResult<Vec<Product>> {
    Ok(state.db().products().list_active().await?)
}

/// Finds a product by SKU, then by id.
pub async fn find_product(state: &AppState, key: &str) -> ApiResult<Product> {
    let products = state.db().products();
    if let Some(product) = products.get_by_sku(key).await? {
        return Ok(product);
    }
    products
        .get_by_id(key)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", key))
}

pub async fn add_product(state: &AppState, new: NewProduct) -> ApiResult<Product> {
    require(state, Capability::ManageCatalog)?;
    debug!(sku = %new.sku, "add_product command");

    let product = state.db().products().insert(new).await?;
    if !product.current_stock.is_zero() {
        state.events.publish(AppEvent::StockChanged {
            product_id: product.id.clone(),
            stock: product.current_stock,
        });
    }
    Ok(product)
}

/// Sets (`Some`) or clears (`None`) one tier's price. Tier 1 cannot be
/// cleared.
pub async fn set_price(state: &AppState, key: &str, tier: PriceTier, price: Option<Money>) -> ApiResult<Product> {
    require(state, Capability::ManageCatalog)?;

    let product = find_product(state, key).await?;
    Ok(state.db().products().set_price(&product.id, tier, price).await?)
}

pub async fn set_cost(state: &AppState, key: &str, cost_per_kg: Option<Money>) -> ApiResult<Product> {
    require(state, Capability::ManageCatalog)?;

    let product = find_product(state, key).await?;
    state.db().products().set_cost(&product.id, cost_per_kg).await?;
    find_product(state, &product.id).await
}

pub async fn list_clients(state: &AppState) -> ApiResult<Vec<Client>> {
    Ok(state.db().clients().list_active().await?)
}

/// Finds a client by id, then by exact name.
pub async fn find_client(state: &AppState, key: &str) -> ApiResult<Client> {
    if let Some(client) = state.db().clients().get_by_id(key).await? {
        return Ok(client);
    }
    let wanted = key.trim().to_lowercase();
    list_clients(state)
        .await?
        .into_iter()
        .find(|c| c.name.to_lowercase() == wanted)
        .ok_or_else(|| ApiError::not_found("Client", key))
}

pub async fn add_client(state: &AppState, new: NewClient) -> ApiResult<Client> {
    require(state, Capability::ManageCatalog)?;
    Ok(state.db().clients().insert(new).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{product, state_as};
    use crate::error::ErrorCode;
    use bascula_core::Role;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_price_tiers_by_sku() {
        let state = state_as(Role::Admin).await;
        product(&state, "JIT", dec!(24.90), dec!(10)).await;

        let tier3 = PriceTier::new(3).unwrap();
        let updated = set_price(&state, "JIT", tier3, Some(Money::new(dec!(21.5)))).await.unwrap();
        assert_eq!(updated.prices.get(tier3), Some(Money::new(dec!(21.5))));

        let err = set_price(&state, "JIT", PriceTier::BASE, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let updated = set_cost(&state, "JIT", Some(Money::new(dec!(15)))).await.unwrap();
        assert_eq!(updated.cost_per_kg, Some(Money::new(dec!(15))));
    }

    #[tokio::test]
    async fn test_clients_found_by_name() {
        let state = state_as(Role::Admin).await;
        add_client(
            &state,
            NewClient {
                name: "Fonda La Güera".to_string(),
                default_tier: PriceTier::new(2).unwrap(),
                credit_limit: None,
            },
        )
        .await
        .unwrap();

        let client = find_client(&state, "fonda la güera").await.unwrap();
        assert_eq!(client.default_tier.index(), 2);
        assert!(find_client(&state, "nadie").await.is_err());
    }

    #[tokio::test]
    async fn test_supervisor_cannot_edit_catalog() {
        let state = state_as(Role::Supervisor).await;
        let err = add_client(
            &state,
            NewClient {
                name: "X".to_string(),
                default_tier: PriceTier::BASE,
                credit_limit: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}
