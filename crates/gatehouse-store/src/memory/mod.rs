//! In-memory store backing every repository trait.
//!
//! All state lives in sharded concurrent maps behind one `Arc`, so a
//! cheaply-cloned `MemStore` handle can be handed to each service.
//! Conditional updates (visit transitions) run under the map's shard
//! lock via `get_mut`, which is what makes the compare-and-swap
//! contract hold without a separate lock.

mod identity;
mod rbac;
mod visits;

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use gatehouse_core::models::permission::Permission;
use gatehouse_core::models::principal::{Principal, PrincipalProfile};
use gatehouse_core::models::role::{Role, RoleWithPermissions};
use gatehouse_core::models::tenant::Tenant;
use gatehouse_core::models::visit::{HostSummary, Visit, VisitDetails};
use gatehouse_core::models::visitor::Visitor;
use gatehouse_core::repository::{PaginatedResult, Pagination};
use gatehouse_core::{GatehouseError, GatehouseResult};

#[derive(Default)]
struct MemDb {
    tenants: DashMap<Uuid, Tenant>,
    principals: DashMap<Uuid, Principal>,
    roles: DashMap<Uuid, Role>,
    /// role id -> permission ids granted to it.
    role_grants: DashMap<Uuid, Vec<Uuid>>,
    /// principal id -> role ids assigned to it.
    principal_roles: DashMap<Uuid, Vec<Uuid>>,
    permissions: DashMap<Uuid, Permission>,
    visitors: DashMap<Uuid, Visitor>,
    visits: DashMap<Uuid, Visit>,
}

#[derive(Clone, Default)]
pub struct MemStore {
    db: Arc<MemDb>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// Cross-module lookup helpers. Each copies values out of the maps before
// joining, so no two shard locks are ever held at once.
impl MemStore {
    fn tenant(&self, id: Uuid) -> GatehouseResult<Tenant> {
        self.db
            .tenants
            .get(&id)
            .map(|t| t.clone())
            .ok_or_else(|| GatehouseError::not_found("tenant"))
    }

    fn principal(&self, id: Uuid) -> GatehouseResult<Principal> {
        self.db
            .principals
            .get(&id)
            .map(|p| p.clone())
            .ok_or_else(|| GatehouseError::not_found("principal"))
    }

    /// Roles with their permissions for one principal.
    fn roles_of(&self, principal_id: Uuid) -> Vec<RoleWithPermissions> {
        let role_ids = self
            .db
            .principal_roles
            .get(&principal_id)
            .map(|ids| ids.clone())
            .unwrap_or_default();
        role_ids
            .into_iter()
            .filter_map(|role_id| self.role_with_permissions(role_id))
            .collect()
    }

    fn role_with_permissions(&self, role_id: Uuid) -> Option<RoleWithPermissions> {
        let role = self.db.roles.get(&role_id)?.clone();
        let grant_ids = self
            .db
            .role_grants
            .get(&role_id)
            .map(|ids| ids.clone())
            .unwrap_or_default();
        let permissions = grant_ids
            .into_iter()
            .filter_map(|pid| self.db.permissions.get(&pid).map(|p| p.clone()))
            .collect();
        Some(RoleWithPermissions { role, permissions })
    }

    fn assemble_profile(&self, principal: Principal) -> GatehouseResult<PrincipalProfile> {
        let tenant = self.tenant(principal.tenant_id)?;
        let roles = self.roles_of(principal.id);
        Ok(PrincipalProfile {
            id: principal.id,
            tenant_id: principal.tenant_id,
            tenant_name: tenant.name,
            tenant_active: tenant.is_active,
            email: principal.email,
            password_hash: principal.password_hash,
            first_name: principal.first_name,
            last_name: principal.last_name,
            is_active: principal.is_active,
            is_super_admin: principal.is_super_admin,
            roles,
        })
    }

    fn host_summary(&self, host_id: Uuid) -> GatehouseResult<HostSummary> {
        let host = self
            .db
            .principals
            .get(&host_id)
            .map(|p| p.clone())
            .ok_or_else(|| GatehouseError::not_found("host"))?;
        Ok(HostSummary {
            id: host.id,
            first_name: host.first_name,
            last_name: host.last_name,
            email: host.email,
        })
    }

    fn visit_details(&self, visit: Visit) -> GatehouseResult<VisitDetails> {
        let visitor = self
            .db
            .visitors
            .get(&visit.visitor_id)
            .map(|v| v.clone())
            .ok_or_else(|| GatehouseError::not_found("visitor"))?;
        let host = self.host_summary(visit.host_id)?;
        Ok(VisitDetails {
            visit,
            visitor,
            host,
        })
    }
}

fn paginate<T>(items: Vec<T>, pagination: Pagination) -> PaginatedResult<T> {
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(pagination.offset as usize)
        .take(pagination.limit as usize)
        .collect();
    PaginatedResult {
        items,
        total,
        offset: pagination.offset,
        limit: pagination.limit,
    }
}
