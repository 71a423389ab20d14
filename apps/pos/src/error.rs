//! # API Error Type
//!
//! Unified error type for shell commands.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Báscula                                │
//! │                                                                         │
//! │  resolve_weight ── WeighError ──┐                                       │
//! │                                 ▼                                       │
//! │  OrderDraft / inventory ── CoreError ──┐                                │
//! │                                        ▼                                │
//! │  repositories ─────────────────── DbError ──► ApiError { code, message }│
//! │                                                       │                 │
//! │                                                       ▼                 │
//! │                                   stderr / {"code": "...", ...}         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every calculator and gate failure is recoverable: the operator fixes the
//! field and retries, so each maps to a specific code instead of `Internal`.

use bascula_core::{AuthorizationError, CoreError, ValidationError, WeighError};
use bascula_db::DbError;
use serde::Serialize;

/// Error returned from commands.
///
/// ```json
/// { "code": "NEGATIVE_NET_WEIGHT", "message": "Net weight must be positive: ..." }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Weighing attempted without a tare
    NoTareSelected,

    /// Zero or negative quantity
    InvalidQuantity,

    /// Containers weigh as much as the gross reading
    NegativeNetWeight,

    /// Insufficient stock
    InsufficientStock,

    /// Authorization gate refused the operation
    Forbidden,

    /// Order draft rule violated
    OrderError,

    /// Database operation failed
    DatabaseError,

    /// Configuration could not be loaded
    ConfigError,

    /// Internal error
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<WeighError> for ApiError {
    fn from(err: WeighError) -> Self {
        let code = match &err {
            WeighError::NoTareSelected => ErrorCode::NoTareSelected,
            WeighError::InvalidQuantity { .. } => ErrorCode::InvalidQuantity,
            WeighError::NegativeNetWeight { .. } => ErrorCode::NegativeNetWeight,
            WeighError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            WeighError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<AuthorizationError> for ApiError {
    fn from(err: AuthorizationError) -> Self {
        ApiError::new(ErrorCode::Forbidden, err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Weigh(e) => e.into(),
            CoreError::Authorization(e) => e.into(),
            CoreError::Validation(e) => e.into(),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::LineNotFound(id) => ApiError::not_found("Order line", &id),
            CoreError::OrderTooLarge { .. } | CoreError::EmptyOrder => {
                ApiError::new(ErrorCode::OrderError, err.to_string())
            }
            CoreError::ReservedTare | CoreError::MissingBasePrice(_) => {
                ApiError::validation(err.to_string())
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => e.into(),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::validation(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::InvalidData { field, reason } => {
                tracing::error!(field = %field, "Corrupt stored value: {}", reason);
                ApiError::new(ErrorCode::DatabaseError, format!("Stored {} is unreadable", field))
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result alias for commands.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use bascula_core::{Capability, Kilograms};
    use rust_decimal_macros::dec;

    #[test]
    fn test_weigh_errors_keep_their_code() {
        let err: ApiError = WeighError::NegativeNetWeight {
            gross: Kilograms::new(dec!(3)),
            tare_total: Kilograms::new(dec!(3.6)),
            net: Kilograms::new(dec!(-0.6)),
        }
        .into();
        assert_eq!(err.code, ErrorCode::NegativeNetWeight);

        let err: ApiError = DbError::Domain(CoreError::Weigh(WeighError::NoTareSelected)).into();
        assert_eq!(err.code, ErrorCode::NoTareSelected);
    }

    #[test]
    fn test_insufficient_stock_message_has_both_quantities() {
        let err: ApiError = WeighError::InsufficientStock {
            requested: Kilograms::new(dec!(12.5)),
            available: Kilograms::new(dec!(10)),
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("12.5"));
        assert!(err.message.contains("10"));
    }

    #[test]
    fn test_gate_denial_is_forbidden() {
        let err: ApiError = DbError::from(AuthorizationError::Denied {
            principal: "caro".to_string(),
            capability: Capability::AdjustStock,
        })
        .into();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(err.message, "caro is not allowed to adjust stock");
    }

    #[test]
    fn test_serializes_screaming_code() {
        let json = serde_json::to_value(ApiError::not_found("Tare", "x")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Tare not found: x");
    }
}
