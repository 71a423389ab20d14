//! # Client Repository
//!
//! Customer accounts and their default price tier.

use bascula_core::validation::{validate_client_name, validate_price};
use bascula_core::{Client, Money, PriceTier};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::{generate_id, optional_money_column, tier_column};

#[derive(Debug, FromRow)]
struct ClientRow {
    id: String,
    name: String,
    default_tier: i64,
    credit_limit: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ClientRow> for Client {
    type Error = DbError;

    fn try_from(row: ClientRow) -> DbResult<Self> {
        Ok(Client {
            default_tier: tier_column("clients.default_tier", row.default_tier)?,
            credit_limit: optional_money_column("clients.credit_limit", row.credit_limit.as_deref())?,
            id: row.id,
            name: row.name,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

const SELECT_CLIENT: &str =
    "SELECT id, name, default_tier, credit_limit, is_active, created_at FROM clients";

/// Fields for a new client.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub default_tier: PriceTier,
    pub credit_limit: Option<Money>,
}

#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    pub async fn insert(&self, new: NewClient) -> DbResult<Client> {
        let name = validate_client_name(&new.name)?;
        if let Some(limit) = new.credit_limit {
            validate_price("credit limit", limit)?;
        }

        let client = Client {
            id: generate_id(),
            name,
            default_tier: new.default_tier,
            credit_limit: new.credit_limit,
            is_active: true,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO clients (id, name, default_tier, credit_limit, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5)
            "#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(client.default_tier.index())
        .bind(client.credit_limit.map(|c| c.amount().to_string()))
        .bind(client.created_at)
        .execute(&self.pool)
        .await?;

        info!(id = %client.id, name = %client.name, tier = %client.default_tier, "Client created");
        Ok(client)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let row: Option<ClientRow> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_CLIENT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Client::try_from).transpose()
    }

    /// Active clients sorted by name.
    pub async fn list_active(&self) -> DbResult<Vec<Client>> {
        let rows: Vec<ClientRow> = sqlx::query_as(&format!(
            "{} WHERE is_active = 1 ORDER BY name COLLATE NOCASE",
            SELECT_CLIENT
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Client::try_from).collect()
    }

    pub async fn set_default_tier(&self, id: &str, tier: PriceTier) -> DbResult<()> {
        let result = sqlx::query("UPDATE clients SET default_tier = ?2 WHERE id = ?1")
            .bind(id)
            .bind(tier.index())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }
        Ok(())
    }
}
