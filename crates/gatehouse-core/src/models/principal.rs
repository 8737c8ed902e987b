//! Principal domain model.
//!
//! A principal is an identity inside exactly one tenant. The same
//! natural person holds one principal record per tenant, linked only by
//! a matching email — there is no cross-tenant foreign key.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::RoleWithPermissions;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    /// Argon2id PHC-format hash.
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    /// Bypasses all permission checks. Not a permission, not
    /// tenant-scoped.
    pub is_super_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrincipal {
    pub tenant_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_super_admin: bool,
}

/// A principal loaded with its tenant context and assigned roles,
/// as needed to build a session claim set.
#[derive(Debug, Clone)]
pub struct PrincipalProfile {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub tenant_active: bool,
    pub email: String,
    /// Argon2id PHC-format hash, for credential verification. Never
    /// serialized into claims or responses.
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_super_admin: bool,
    pub roles: Vec<RoleWithPermissions>,
}

impl PrincipalProfile {
    pub fn role_keys(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.role.key.clone()).collect()
    }

    /// Flattened, de-duplicated union of permission keys across all
    /// assigned roles. Sorted for a deterministic claim set.
    pub fn permission_keys(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .roles
            .iter()
            .flat_map(|r| r.permissions.iter().map(|p| p.key.as_str()))
            .collect();
        set.into_iter().map(str::to_owned).collect()
    }
}

/// The two booleans the session validator needs per request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Liveness {
    pub principal_active: bool,
    pub tenant_active: bool,
}

impl Liveness {
    pub fn is_live(&self) -> bool {
        self.principal_active && self.tenant_active
    }
}
