//! # Database State
//!
//! Wraps the `Database` for commands. The pool inside is thread-safe, so
//! commands query concurrently without extra locking.

use bascula_db::{Database, DbConfig};
use std::path::PathBuf;
use tracing::info;

use crate::error::ApiResult;

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Opens (creating if needed) the database file and migrates it.
    pub async fn open(path: PathBuf) -> ApiResult<Self> {
        info!(?path, "Opening database");
        let db = Database::new(DbConfig::new(path)).await?;
        Ok(DbState::new(db))
    }

    /// Fresh in-memory database.
    pub async fn in_memory() -> ApiResult<Self> {
        let db = Database::new(DbConfig::in_memory()).await?;
        Ok(DbState::new(db))
    }

    pub fn inner(&self) -> &Database {
        &self.db
    }
}
