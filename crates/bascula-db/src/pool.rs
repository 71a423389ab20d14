//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  AppConfig.database_path                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path)          DbConfig::in_memory()  (tests)            │
//! │       │                               │                                 │
//! │       └──────────────┬────────────────┘                                 │
//! │                      ▼                                                  │
//! │  Database::new(config).await                                            │
//! │       ├── create parent directory                                       │
//! │       ├── WAL, NORMAL sync, foreign keys, busy timeout                  │
//! │       ├── SqlitePool                                                    │
//! │       └── embedded migrations (seeds the piece-sale tare)               │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  db.tares() / products() / clients() / orders() / movements() / reports()│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Order commits and stock movements are short write transactions. The busy
//! timeout lets a second writer wait for the first instead of failing with
//! `SQLITE_BUSY`.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::client::ClientRepository;
use crate::repository::movement::MovementRepository;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;
use crate::repository::report::ReportRepository;
use crate::repository::tare::TareRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/bascula/bascula.db")
///     .max_connections(4)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool. Default: 5.
    pub max_connections: u32,

    /// Minimum number of connections kept open. Default: 1.
    pub min_connections: u32,

    /// How long to wait for a pooled connection. Default: 30 s.
    pub connect_timeout: Duration,

    /// How long a writer waits on a locked database. Default: 5 s.
    pub busy_timeout: Duration,

    /// Whether to run migrations on connect. Default: true.
    pub run_migrations: bool,
}

impl DbConfig {
    /// Configuration for a database file, created on first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// An isolated in-memory database.
    ///
    /// Pinned to a single connection: every SQLite `:memory:` connection
    /// is a separate database.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            connect_timeout: Duration::from_secs(5),
            ..DbConfig::new(IN_MEMORY)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(IN_MEMORY)
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::new().in_memory(true)
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };

        options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone: every repository gets its own handle to the same pool.
///
/// ## Usage in Commands
/// ```rust,ignore
/// pub async fn list_tares(state: &AppState) -> Result<Vec<TareSpec>, ApiError> {
///     Ok(state.db.tares().list().await?)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, applies migrations.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Initializing database connection");

        if !config.is_in_memory() {
            if let Some(parent) = config.database_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DbError::ConnectionFailed(format!(
                            "cannot create {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            // an idle :memory: connection must never be reaped
            .idle_timeout(if config.is_in_memory() {
                None
            } else {
                Some(Duration::from_secs(600))
            })
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Database pool created");

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool access for queries not covered by a repository.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the tare catalog repository.
    pub fn tares(&self) -> TareRepository {
        TareRepository::new(self.pool.clone())
    }

    /// Returns the product repository.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let product = db.products().get_by_sku("JIT-SAL").await?;
    /// ```
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the client repository.
    pub fn clients(&self) -> ClientRepository {
        ClientRepository::new(self.pool.clone())
    }

    /// Returns the order repository.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Returns the stock movement repository.
    pub fn movements(&self) -> MovementRepository {
        MovementRepository::new(self.pool.clone())
    }

    /// Returns the report repository.
    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// True when the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/bascula-test.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_secs(1));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_secs(1));
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_dir() {
        let dir = std::env::temp_dir().join(format!("bascula-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("bascula.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(db.health_check().await);
        db.close().await;

        assert!(path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
