//! # Tare Repository
//!
//! The tare catalog. The piece-sale sentinel row is seeded by the initial
//! migration under [`PIECE_SALE_TARE_ID`]; this repository refuses to edit
//! or delete it, and refuses any other row taking its name.

use bascula_core::validation::{validate_tare_name, validate_weight};
use bascula_core::{CoreError, Kilograms, TareSpec, PIECE_SALE_TARE_NAME};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{generate_id, kilograms_column};

/// Fixed id of the seeded piece-sale tare.
pub const PIECE_SALE_TARE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[derive(Debug, FromRow)]
struct TareRow {
    id: String,
    name: String,
    unit_weight: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TareRow> for TareSpec {
    type Error = DbError;

    fn try_from(row: TareRow) -> DbResult<Self> {
        Ok(TareSpec {
            unit_weight: kilograms_column("tares.unit_weight", &row.unit_weight)?,
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_TARE: &str = "SELECT id, name, unit_weight, created_at, updated_at FROM tares";

/// Repository for the tare catalog.
#[derive(Debug, Clone)]
pub struct TareRepository {
    pool: SqlitePool,
}

impl TareRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TareRepository { pool }
    }

    /// All tares: the piece-sale entry first, then by name.
    pub async fn list(&self) -> DbResult<Vec<TareSpec>> {
        let rows: Vec<TareRow> = sqlx::query_as(&format!(
            "{} ORDER BY (id = ?1) DESC, name COLLATE NOCASE",
            SELECT_TARE
        ))
        .bind(PIECE_SALE_TARE_ID)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed tares");
        rows.into_iter().map(TareSpec::try_from).collect()
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<TareSpec>> {
        let row: Option<TareRow> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_TARE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TareSpec::try_from).transpose()
    }

    /// Case-insensitive lookup by name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<TareSpec>> {
        let row: Option<TareRow> = sqlx::query_as(&format!("{} WHERE name = ?1", SELECT_TARE))
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TareSpec::try_from).transpose()
    }

    /// The seeded piece-sale tare.
    pub async fn piece_sale(&self) -> DbResult<TareSpec> {
        self.get_by_id(PIECE_SALE_TARE_ID)
            .await?
            .ok_or_else(|| DbError::not_found("Tare", PIECE_SALE_TARE_NAME))
    }

    /// Adds a container tare.
    ///
    /// ## Errors
    /// - `Validation` for an empty, too long or reserved name, or a negative weight
    /// - `UniqueViolation` when the name is taken
    pub async fn create(&self, name: &str, unit_weight: Kilograms) -> DbResult<TareSpec> {
        let name = validate_tare_name(name)?;
        validate_weight("unit weight", unit_weight)?;

        let now = Utc::now();
        let tare = TareSpec {
            id: generate_id(),
            name,
            unit_weight: unit_weight.rounded(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO tares (id, name, unit_weight, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&tare.id)
        .bind(&tare.name)
        .bind(tare.unit_weight.value().to_string())
        .bind(tare.created_at)
        .bind(tare.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value("tare name", &tare.name))?;

        info!(id = %tare.id, name = %tare.name, unit_weight = %tare.unit_weight, "Tare created");
        Ok(tare)
    }

    /// Renames and/or reweighs a tare. `None` keeps the current value.
    pub async fn update(
        &self,
        id: &str,
        name: Option<&str>,
        unit_weight: Option<Kilograms>,
    ) -> DbResult<TareSpec> {
        if id == PIECE_SALE_TARE_ID {
            return Err(CoreError::ReservedTare.into());
        }

        let mut tare = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Tare", id))?;

        if let Some(name) = name {
            tare.name = validate_tare_name(name)?;
        }
        if let Some(weight) = unit_weight {
            validate_weight("unit weight", weight)?;
            tare.unit_weight = weight.rounded();
        }
        tare.updated_at = Utc::now();

        sqlx::query("UPDATE tares SET name = ?2, unit_weight = ?3, updated_at = ?4 WHERE id = ?1")
            .bind(&tare.id)
            .bind(&tare.name)
            .bind(tare.unit_weight.value().to_string())
            .bind(tare.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_duplicate_value("tare name", &tare.name))?;

        info!(id = %tare.id, name = %tare.name, unit_weight = %tare.unit_weight, "Tare updated");
        Ok(tare)
    }

    /// Deletes a tare. Past order lines keep their name snapshot.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        if id == PIECE_SALE_TARE_ID {
            return Err(CoreError::ReservedTare.into());
        }

        let result = sqlx::query("DELETE FROM tares WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Tare", id));
        }

        info!(id = %id, "Tare deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use bascula_core::ValidationError;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_sentinel_is_seeded() {
        let db = test_db().await;
        let sentinel = db.tares().piece_sale().await.unwrap();

        assert!(sentinel.is_piece_sale());
        assert!(sentinel.unit_weight.is_zero());
    }

    #[tokio::test]
    async fn test_create_and_list_order() {
        let db = test_db().await;
        let repo = db.tares();

        repo.create("Reja madera", Kilograms::new(dec!(2.4))).await.unwrap();
        repo.create("  caja plástica ", Kilograms::new(dec!(1.1))).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec![PIECE_SALE_TARE_NAME, "caja plástica", "Reja madera"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;
        let repo = db.tares();

        repo.create("Caja", Kilograms::new(dec!(1))).await.unwrap();
        let err = repo.create("caja", Kilograms::new(dec!(2))).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_reserved_name_and_negative_weight_rejected() {
        let db = test_db().await;
        let repo = db.tares();

        let err = repo
            .create(PIECE_SALE_TARE_NAME, Kilograms::zero())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Reserved { .. }))
        ));

        assert!(repo.create("Caja", Kilograms::new(dec!(-1))).await.is_err());
    }

    #[tokio::test]
    async fn test_sentinel_cannot_be_edited_or_deleted() {
        let db = test_db().await;
        let repo = db.tares();

        let err = repo.update(PIECE_SALE_TARE_ID, Some("Otra"), None).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ReservedTare)));

        let err = repo.delete(PIECE_SALE_TARE_ID).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ReservedTare)));

        assert!(repo.piece_sale().await.is_ok());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_db().await;
        let repo = db.tares();

        let tare = repo.create("Caja", Kilograms::new(dec!(1))).await.unwrap();
        let updated = repo
            .update(&tare.id, None, Some(Kilograms::new(dec!(1.25))))
            .await
            .unwrap();
        assert_eq!(updated.name, "Caja");
        assert_eq!(updated.unit_weight.value(), dec!(1.25));

        repo.delete(&tare.id).await.unwrap();
        assert!(repo.get_by_id(&tare.id).await.unwrap().is_none());
        assert!(matches!(repo.delete(&tare.id).await, Err(DbError::NotFound { .. })));
    }
}
