//! # Configuration
//!
//! ## Configuration Sources (later overrides earlier)
//! 1. Defaults (this file)
//! 2. Config file `bascula.toml` in the platform config dir
//!    (`~/.config/bascula/bascula.toml` on Linux)
//! 3. Environment variables (`BASCULA_*`)
//!
//! ```toml
//! # bascula.toml
//! store_name = "Frutas y Legumbres Lupita"
//! database_path = "/srv/bascula/bascula.db"
//! operator = "beto"
//! role = "supervisor"
//! ```
//!
//! Read-only after startup.

use bascula_core::{Principal, Role};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const CONFIG_FILE: &str = "bascula.toml";
const DATABASE_FILE: &str = "bascula.db";
const DRAFT_FILE: &str = "draft.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    #[error("Could not determine the app data directory")]
    NoDataDir,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Shown on the order summary.
    pub store_name: String,

    /// SQLite file. Default: `bascula.db` in the platform data dir.
    pub database_path: Option<PathBuf>,

    /// Where the open order draft is kept between invocations.
    /// Default: `draft.json` next to the database.
    pub draft_path: Option<PathBuf>,

    /// Operator name recorded on orders and authorized movements.
    pub operator: String,

    /// Role the authorization policy evaluates.
    pub role: Role,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            store_name: "Báscula".to_string(),
            database_path: None,
            draft_path: None,
            operator: "caja".to_string(),
            role: Role::Cashier,
        }
    }
}

impl AppConfig {
    /// Loads defaults, then `config_path` (or the platform config file),
    /// then environment overrides.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// `lookup` returns the value of an environment variable, if set.
    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("BASCULA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(name) = lookup("BASCULA_STORE_NAME") {
            self.store_name = name;
        }

        if let Some(operator) = lookup("BASCULA_OPERATOR") {
            let operator = operator.trim().to_string();
            if operator.is_empty() {
                return Err(ConfigError::InvalidEnv {
                    var: "BASCULA_OPERATOR",
                    reason: "must not be empty".to_string(),
                });
            }
            self.operator = operator;
        }

        if let Some(role) = lookup("BASCULA_ROLE") {
            self.role = role.parse().map_err(|reason| ConfigError::InvalidEnv {
                var: "BASCULA_ROLE",
                reason,
            })?;
        }

        Ok(())
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("mx", "bascula", "bascula")
    }

    /// Database file, falling back to the platform data dir.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Self::project_dirs()
                .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
                .ok_or(ConfigError::NoDataDir),
        }
    }

    /// Draft file, next to the database unless configured.
    pub fn draft_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.draft_path {
            return Ok(path.clone());
        }
        let db = self.database_path()?;
        Ok(db
            .parent()
            .map(|dir| dir.join(DRAFT_FILE))
            .unwrap_or_else(|| PathBuf::from(DRAFT_FILE)))
    }

    /// The operator the authorization policy evaluates.
    pub fn principal(&self) -> Principal {
        Principal::new(self.operator.clone(), self.role)
    }
}
