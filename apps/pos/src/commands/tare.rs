//! # Tare Commands
//!
//! The tare catalog. Tares are looked up by id or by name, so the shell
//! accepts `--tare "Caja plástica"`.

use bascula_core::{Capability, Kilograms, TareSpec};
use tracing::debug;

use super::require;
use crate::error::{ApiError, ApiResult};
use crate::events::AppEvent;
use crate::state::AppState;

/// All tares, the piece-sale entry first.
pub async fn list_tares(state: &AppState) -> ApiResult<Vec<TareSpec>> {
    Ok(state.db().tares().list().await?)
}

/// Finds a tare by id, then by name (case-insensitive).
pub async fn find_tare(state: &AppState, key: &str) -> ApiResult<TareSpec> {
    let tares = state.db().tares();
    if let Some(tare) = tares.get_by_id(key).await? {
        return Ok(tare);
    }
    tares
        .get_by_name(key)
        .await?
        .ok_or_else(|| ApiError::not_found("Tare", key))
}

pub async fn add_tare(state: &AppState, name: &str, unit_weight: Kilograms) -> ApiResult<TareSpec> {
    require(state, Capability::ManageCatalog)?;
    debug!(name = %name, unit_weight = %unit_weight, "add_tare command");

    let tare = state.db().tares().create(name, unit_weight).await?;
    state.events.publish(AppEvent::TareCatalogChanged);
    Ok(tare)
}

pub async fn edit_tare(
    state: &AppState,
    key: &str,
    name: Option<&str>,
    unit_weight: Option<Kilograms>,
) -> ApiResult<TareSpec> {
    require(state, Capability::ManageCatalog)?;
    if name.is_none() && unit_weight.is_none() {
        return Err(ApiError::validation("Nothing to change: give a new name or weight"));
    }

    let current = find_tare(state, key).await?;
    let tare = state.db().tares().update(&current.id, name, unit_weight).await?;
    state.events.publish(AppEvent::TareCatalogChanged);
    Ok(tare)
}

pub async fn remove_tare(state: &AppState, key: &str) -> ApiResult<TareSpec> {
    require(state, Capability::ManageCatalog)?;

    let tare = find_tare(state, key).await?;
    state.db().tares().delete(&tare.id).await?;
    state.events.publish(AppEvent::TareCatalogChanged);
    Ok(tare)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::state_as;
    use crate::error::ErrorCode;
    use bascula_core::{Role, PIECE_SALE_TARE_NAME};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_add_edit_remove_by_name() {
        let state = state_as(Role::Admin).await;
        let mut events = state.events.subscribe();

        add_tare(&state, "Reja", Kilograms::new(dec!(2.4))).await.unwrap();
        assert_eq!(events.recv().await.unwrap(), AppEvent::TareCatalogChanged);

        let edited = edit_tare(&state, "reja", Some("Reja madera"), None).await.unwrap();
        assert_eq!(edited.name, "Reja madera");
        assert_eq!(edited.unit_weight.value(), dec!(2.4));

        remove_tare(&state, "Reja madera").await.unwrap();
        let names: Vec<String> = list_tares(&state).await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec![PIECE_SALE_TARE_NAME]);
    }

    #[tokio::test]
    async fn test_cashier_cannot_manage_tares() {
        let state = state_as(Role::Cashier).await;
        let err = add_tare(&state, "Caja", Kilograms::new(dec!(1))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_sentinel_protected() {
        let state = state_as(Role::Admin).await;
        let err = remove_tare(&state, PIECE_SALE_TARE_NAME).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = edit_tare(&state, "nope", None, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
