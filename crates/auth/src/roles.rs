use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role identifier carried in tokens.
///
/// Unknown roles are allowed and simply grant nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Static role policy.
    ///
    /// - `admin`: everything
    /// - `manager`: catalogue, zones and stock
    /// - `operator`: stock movements only
    pub fn granted_permissions(&self) -> Vec<Permission> {
        match self.as_str() {
            "admin" => vec![Permission::WILDCARD],
            "manager" => vec![
                Permission::PRODUCTS_CREATE,
                Permission::PRODUCTS_UPDATE,
                Permission::PRODUCTS_DELETE,
                Permission::STOCK_ADJUST,
                Permission::ZONES_MANAGE,
            ],
            "operator" => vec![Permission::STOCK_ADJUST],
            _ => Vec::new(),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_may_only_move_stock() {
        assert_eq!(
            Role::new("operator").granted_permissions(),
            vec![Permission::STOCK_ADJUST]
        );
    }

    #[test]
    fn unknown_roles_grant_nothing() {
        assert!(Role::new("viewer").granted_permissions().is_empty());
    }
}
