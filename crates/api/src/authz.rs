//! API-side authorization guard.
//!
//! Handlers call this before touching the store, keeping the ledger and the
//! stores auth-agnostic.

use stockyard_auth::{AuthzError, Permission, Principal, authorize};

use crate::context::PrincipalContext;

/// Check that the request's principal holds `permission`.
pub fn authorize_request(
    principal: &PrincipalContext,
    permission: &Permission,
) -> Result<(), AuthzError> {
    let principal = Principal {
        user_id: principal.user_id(),
        roles: principal.roles().to_vec(),
        permissions: principal
            .roles()
            .iter()
            .flat_map(|role| role.granted_permissions())
            .collect(),
    };
    authorize(&principal, permission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockyard_auth::Role;
    use stockyard_core::UserId;

    fn principal(roles: &[&'static str]) -> PrincipalContext {
        PrincipalContext::new(
            UserId::new(),
            "tester",
            roles.iter().map(|r| Role::new(*r)).collect(),
        )
    }

    #[test]
    fn operator_may_adjust_stock_but_not_manage_zones() {
        let p = principal(&["operator"]);
        assert!(authorize_request(&p, &Permission::STOCK_ADJUST).is_ok());
        assert!(authorize_request(&p, &Permission::ZONES_MANAGE).is_err());
    }

    #[test]
    fn admin_has_everything_and_unknown_roles_nothing() {
        assert!(authorize_request(&principal(&["admin"]), &Permission::PRODUCTS_DELETE).is_ok());
        assert!(authorize_request(&principal(&["visitor"]), &Permission::STOCK_ADJUST).is_err());
    }
}
