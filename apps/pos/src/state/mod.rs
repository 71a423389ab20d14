//! # State Module
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    AppState                                             │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐ ┌────────────────┐ │
//! │  │   DbState    │ │  DraftState  │ │   EventBus   │ │   AppConfig    │ │
//! │  │  Database    │ │  Arc<Mutex<  │ │  broadcast   │ │  operator,     │ │
//! │  │  (SQLite     │ │   OrderDraft │ │  AppEvent    │ │  role, paths   │ │
//! │  │   pool)      │ │  >> + file   │ │              │ │                │ │
//! │  └──────────────┘ └──────────────┘ └──────────────┘ └────────────────┘ │
//! │                                                                         │
//! │  policy: Arc<dyn AuthorizationPolicy>   (RolePolicy unless replaced)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands receive `&AppState` explicitly; there is no global state.

mod config;
mod db;
mod order;

pub use config::{AppConfig, ConfigError};
pub use db::DbState;
pub use order::DraftState;

use bascula_core::{AuthorizationPolicy, Principal, RolePolicy};
use bascula_db::Database;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::events::EventBus;

#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub draft: DraftState,
    pub events: EventBus,
    pub config: AppConfig,
    pub policy: Arc<dyn AuthorizationPolicy>,
}

impl AppState {
    /// Opens the configured database and restores the saved draft.
    pub async fn open(config: AppConfig) -> ApiResult<Self> {
        let db_path = config.database_path().map_err(config_error)?;
        let draft_path = config.draft_path().map_err(config_error)?;

        let db = DbState::open(db_path).await?;
        let draft = DraftState::load(draft_path)?;

        Ok(AppState {
            db,
            draft,
            events: EventBus::new(),
            config,
            policy: Arc::new(RolePolicy),
        })
    }

    /// In-memory database, unsaved draft.
    pub async fn in_memory(config: AppConfig) -> ApiResult<Self> {
        Ok(AppState {
            db: DbState::in_memory().await?,
            draft: DraftState::new(),
            events: EventBus::new(),
            config,
            policy: Arc::new(RolePolicy),
        })
    }

    /// Replaces the authorization policy.
    pub fn with_policy(mut self, policy: Arc<dyn AuthorizationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn db(&self) -> &Database {
        self.db.inner()
    }

    pub fn principal(&self) -> Principal {
        self.config.principal()
    }
}

fn config_error(err: ConfigError) -> ApiError {
    ApiError::new(ErrorCode::ConfigError, err.to_string())
}
