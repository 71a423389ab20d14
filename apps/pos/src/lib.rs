//! # Báscula POS Library
//!
//! The point-of-sale shell behind the `bascula` binary.
//!
//! ## Module Organization
//! ```text
//! bascula_pos/
//! ├── lib.rs          ◄─── You are here (logging setup, exports)
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState (db, draft, events, config, policy)
//! │   ├── db.rs       ◄─── Database wrapper
//! │   ├── order.rs    ◄─── Order draft: Arc<Mutex<OrderDraft>> + draft file
//! │   └── config.rs   ◄─── AppConfig (TOML + BASCULA_* env)
//! ├── commands/       ◄─── tare, catalog, weighing, order, inventory, report
//! ├── events.rs       ◄─── Typed event bus
//! └── error.rs        ◄─── ApiError for commands
//! ```
//!
//! ## Startup Sequence
//! ```text
//! 1. init_tracing()            RUST_LOG or "info,bascula=debug,sqlx=warn"
//! 2. AppConfig::load()         defaults → bascula.toml → BASCULA_* env
//! 3. AppState::open()          SQLite (WAL, migrations) + saved draft
//! 4. dispatch one command      publish AppEvents, save the draft
//! ```

pub mod commands;
pub mod error;
pub mod events;
pub mod state;

pub use error::{ApiError, ApiResult, ErrorCode};
pub use events::{AppEvent, EventBus};
pub use state::{AppConfig, AppState};

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,bascula=debug,sqlx=warn";

/// Initializes the tracing subscriber. Logs go to stderr so `--json` output
/// on stdout stays parseable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=bascula_db=trace` - Trace one crate
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
