//! # bascula-db: Database Layer for Báscula
//!
//! This crate provides database access for Báscula.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Báscula Data Flow                                │
//! │                                                                         │
//! │  bascula-pos command (order commit)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   bascula-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ TareRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_init.sql │  │   │
//! │  │   │               │    │ ClientRepo    │    │              │  │   │
//! │  │   │               │    │ OrderRepo     │    │              │  │   │
//! │  │   │               │    │ MovementRepo  │    │              │  │   │
//! │  │   │               │    │ ReportRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (bascula.db, platform data dir)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bascula_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("bascula.db")).await?;
//!
//! let tares = db.tares().list().await?;
//! let order = db.orders().commit(&draft, "caja1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::client::{ClientRepository, NewClient};
pub use repository::movement::{MovementRepository, MovementRequest};
pub use repository::order::{CommittedOrder, OrderRepository};
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::report::ReportRepository;
pub use repository::tare::{TareRepository, PIECE_SALE_TARE_ID};
