//! # Authorization
//!
//! Capability checks for operations that need more than a cashier's rights,
//! chiefly stock adjustments and shrinkage (merma).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Authorization Gate                                   │
//! │                                                                         │
//! │  Principal { name, role }   Capability::AdjustStock                     │
//! │          │                          │                                   │
//! │          └────────────┬─────────────┘                                   │
//! │                       ▼                                                 │
//! │        &dyn AuthorizationPolicy (injected)                              │
//! │                       │                                                 │
//! │              Ok(()) ──┴── Err(Denied)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! How a principal is authenticated is outside this crate. The policy only
//! sees who the caller already is.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::AuthorizationError;

/// An operator's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Supervisor,
    #[default]
    Cashier,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "supervisor" => Ok(Role::Supervisor),
            "cashier" | "cajero" => Ok(Role::Cashier),
            other => Err(format!(
                "Unknown role: '{}'. Valid options: admin, supervisor, cashier",
                other
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Supervisor => write!(f, "supervisor"),
            Role::Cashier => write!(f, "cashier"),
        }
    }
}

/// Something a principal may or may not be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Commit ajuste / merma movements.
    AdjustStock,
    /// Create, edit and delete tares, products and clients.
    ManageCatalog,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::AdjustStock => write!(f, "adjust stock"),
            Capability::ManageCatalog => write!(f, "manage the catalog"),
        }
    }
}

/// The authenticated operator performing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
    pub role: Role,
}

impl Principal {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Principal {
            name: name.into(),
            role,
        }
    }
}

/// Decides whether a principal holds a capability.
///
/// Injected into workflows as `&dyn AuthorizationPolicy` so deployments can
/// swap in a directory- or token-backed check.
pub trait AuthorizationPolicy: Send + Sync {
    fn check(&self, principal: &Principal, capability: Capability) -> Result<(), AuthorizationError>;
}

/// Static role → capability table.
///
/// | role       | AdjustStock | ManageCatalog |
/// |------------|-------------|---------------|
/// | admin      | yes         | yes           |
/// | supervisor | yes         | no            |
/// | cashier    | no          | no            |
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl RolePolicy {
    fn grants(role: Role, capability: Capability) -> bool {
        match (role, capability) {
            (Role::Admin, _) => true,
            (Role::Supervisor, Capability::AdjustStock) => true,
            (Role::Supervisor, Capability::ManageCatalog) => false,
            (Role::Cashier, _) => false,
        }
    }
}

impl AuthorizationPolicy for RolePolicy {
    fn check(&self, principal: &Principal, capability: Capability) -> Result<(), AuthorizationError> {
        if RolePolicy::grants(principal.role, capability) {
            Ok(())
        } else {
            Err(AuthorizationError::Denied {
                principal: principal.name.clone(),
                capability,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_policy_table() {
        let policy = RolePolicy;
        let admin = Principal::new("ana", Role::Admin);
        let sup = Principal::new("beto", Role::Supervisor);
        let cashier = Principal::new("caro", Role::Cashier);

        assert!(policy.check(&admin, Capability::AdjustStock).is_ok());
        assert!(policy.check(&admin, Capability::ManageCatalog).is_ok());
        assert!(policy.check(&sup, Capability::AdjustStock).is_ok());
        assert!(policy.check(&sup, Capability::ManageCatalog).is_err());
        assert!(policy.check(&cashier, Capability::AdjustStock).is_err());
    }

    #[test]
    fn test_denial_names_principal_and_capability() {
        let err = RolePolicy
            .check(&Principal::new("caro", Role::Cashier), Capability::AdjustStock)
            .unwrap_err();
        assert_eq!(err.to_string(), "caro is not allowed to adjust stock");
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("cajero".parse::<Role>().unwrap(), Role::Cashier);
        assert!("root".parse::<Role>().is_err());
    }
}
