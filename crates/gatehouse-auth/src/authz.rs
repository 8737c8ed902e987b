//! Authorization gate.
//!
//! Operates on already-validated claims. A denial here is a distinct
//! error kind from an authentication failure: the caller is known, just
//! not allowed.

use gatehouse_core::{GatehouseError, GatehouseResult};

use crate::token::SessionClaims;

/// Require every permission in `required` (AND semantics). A superadmin
/// claim bypasses the check entirely.
pub fn require_permissions(claims: &SessionClaims, required: &[&str]) -> GatehouseResult<()> {
    if claims.is_super_admin {
        return Ok(());
    }
    let missing = required
        .iter()
        .any(|perm| !claims.permissions.iter().any(|p| p == perm));
    if missing {
        return Err(GatehouseError::AuthorizationDenied {
            reason: "insufficient permissions".into(),
        });
    }
    Ok(())
}

/// Require at least one of `roles` (ANY semantics). Used sparingly
/// where policy is role-based rather than permission-based.
pub fn require_any_role(claims: &SessionClaims, roles: &[&str]) -> GatehouseResult<()> {
    let has_role = roles.iter().any(|role| claims.roles.iter().any(|r| r == role));
    if !has_role {
        return Err(GatehouseError::AuthorizationDenied {
            reason: "insufficient role".into(),
        });
    }
    Ok(())
}

pub fn require_super_admin(claims: &SessionClaims) -> GatehouseResult<()> {
    if !claims.is_super_admin {
        return Err(GatehouseError::AuthorizationDenied {
            reason: "superadmin access required".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn claims(permissions: &[&str], roles: &[&str], is_super_admin: bool) -> SessionClaims {
        SessionClaims {
            sub: Uuid::new_v4().to_string(),
            email: "u@example.com".into(),
            tenant_id: Uuid::new_v4().to_string(),
            roles: roles.iter().map(|s| s.to_string()).collect(),
            permissions: permissions.iter().map(|s| s.to_string()).collect(),
            is_super_admin,
            iss: "gatehouse".into(),
            iat: 0,
            exp: i64::MAX,
            jti: Uuid::new_v4().to_string(),
        }
    }

    #[test]
    fn all_required_permissions_allow() {
        let c = claims(&["visit.view", "visit.checkin"], &[], false);
        assert!(require_permissions(&c, &["visit.view", "visit.checkin"]).is_ok());
    }

    #[test]
    fn one_missing_permission_denies() {
        let c = claims(&["visit.view", "visit.checkout"], &["security"], false);
        let err = require_permissions(&c, &["visit.checkin"]).unwrap_err();
        assert!(matches!(err, GatehouseError::AuthorizationDenied { .. }));
    }

    #[test]
    fn superadmin_bypasses_permissions() {
        let c = claims(&[], &[], true);
        assert!(require_permissions(&c, &["tenant.manage"]).is_ok());
    }

    #[test]
    fn any_role_matches() {
        let c = claims(&[], &["receptionist"], false);
        assert!(require_any_role(&c, &["security", "receptionist"]).is_ok());
        assert!(require_any_role(&c, &["security"]).is_err());
    }

    #[test]
    fn superadmin_gate() {
        assert!(require_super_admin(&claims(&[], &[], true)).is_ok());
        assert!(require_super_admin(&claims(&[], &[], false)).is_err());
    }
}
