//! The static permission catalog and the declarative default roles.
//!
//! Adding a key here propagates to storage on the next startup via the
//! idempotent catalog seeder — no migration tooling involved.

/// Capability keys used throughout the application, grouped by
/// resource.
pub const PERMISSION_KEYS: &[&str] = &[
    "tenant.manage",
    "user.manage",
    "visitor.view",
    "visitor.manage",
    "visit.view",
    "visit.checkin",
    "visit.checkout",
    "visit.view_history",
    "staff.view",
    "staff.manage",
    "vehicles.view",
    "vehicles.manage",
    "spaces.view",
    "spaces.manage",
    "maintenance.view",
    "maintenance.manage",
    "projects.view",
    "projects.manage",
    "calendar.view",
    "calendar.manage",
    "documents.view",
    "documents.manage",
    "compliance.view",
    "compliance.manage",
    "vendors.view",
    "vendors.manage",
    "reports.view",
    "bolos.view",
    "bolos.manage",
    "packages.view",
    "packages.manage",
    "violations.view",
    "violations.manage",
    "pets.view",
    "pets.manage",
    "emergencyContacts.view",
    "emergencyContacts.manage",
    "units.view",
    "units.manage",
];

/// Named constants for the keys this core checks directly.
pub mod keys {
    pub const VISITOR_VIEW: &str = "visitor.view";
    pub const VISITOR_MANAGE: &str = "visitor.manage";
    pub const VISIT_VIEW: &str = "visit.view";
    pub const VISIT_CHECKIN: &str = "visit.checkin";
    pub const VISIT_CHECKOUT: &str = "visit.checkout";
}

/// A system-defined role, reconciled per tenant: created with its full
/// permission set when absent, topped up with missing permissions when
/// present. Grants added by hand are never removed.
#[derive(Debug, Clone, Copy)]
pub struct DefaultRole {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub permissions: &'static [&'static str],
}

pub const DEFAULT_ROLES: &[DefaultRole] = &[
    DefaultRole {
        key: "tenant_owner",
        name: "Tenant Owner",
        description: "Full control over tenant, users, and configuration",
        permissions: PERMISSION_KEYS,
    },
    DefaultRole {
        key: "receptionist",
        name: "Receptionist",
        description: "Manage visitors and visits",
        permissions: &[
            "visitor.view",
            "visitor.manage",
            "visit.view",
            "visit.checkin",
            "visit.checkout",
            "visit.view_history",
            "packages.view",
            "packages.manage",
            "bolos.view",
        ],
    },
    DefaultRole {
        key: "security",
        name: "Security",
        description: "View visits and check out visitors",
        permissions: &[
            "visit.view",
            "visit.checkout",
            "visit.view_history",
            "bolos.view",
            "bolos.manage",
            "vehicles.view",
            "packages.view",
        ],
    },
    DefaultRole {
        key: "resident",
        name: "Resident",
        description: "Resident user (no dashboard permissions)",
        permissions: &[],
    },
];

/// Human-readable description derived from a capability key.
pub fn describe(key: &str) -> String {
    key.replace('.', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for key in PERMISSION_KEYS {
            assert!(seen.insert(key), "duplicate permission key: {key}");
        }
    }

    #[test]
    fn default_role_permissions_exist_in_catalog() {
        for role in DEFAULT_ROLES {
            for perm in role.permissions {
                assert!(
                    PERMISSION_KEYS.contains(perm),
                    "role {} references unknown permission {perm}",
                    role.key
                );
            }
        }
    }

    #[test]
    fn tenant_owner_holds_every_permission() {
        let owner = DEFAULT_ROLES.iter().find(|r| r.key == "tenant_owner").unwrap();
        assert_eq!(owner.permissions.len(), PERMISSION_KEYS.len());
    }
}
