//! RBAC service — catalog seeding, default role reconciliation, and
//! cached role listing.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use gatehouse_core::cache::Cache;
use gatehouse_core::models::permission::CreatePermission;
use gatehouse_core::models::role::{CreateRole, RoleWithPermissions};
use gatehouse_core::repository::{PermissionRepository, RoleRepository, TenantRepository};
use gatehouse_core::{GatehouseError, GatehouseResult};

use crate::catalog::{self, DEFAULT_ROLES, PERMISSION_KEYS};

/// Role definitions change rarely; reads tolerate this much staleness.
/// Reconciliation invalidates the entry explicitly.
const ROLES_CACHE_TTL: Duration = Duration::from_secs(600);

/// Tenants reconciled concurrently per batch, to bound storage
/// connection usage.
const RECONCILE_BATCH_SIZE: usize = 5;

fn roles_key(tenant_id: Uuid) -> String {
    format!("rbac:roles:{tenant_id}")
}

pub struct RbacService<P, R, T, C>
where
    P: PermissionRepository,
    R: RoleRepository,
    T: TenantRepository,
    C: Cache,
{
    permissions: P,
    roles: R,
    tenants: T,
    cache: C,
}

impl<P, R, T, C> RbacService<P, R, T, C>
where
    P: PermissionRepository,
    R: RoleRepository,
    T: TenantRepository,
    C: Cache,
{
    pub fn new(permissions: P, roles: R, tenants: T, cache: C) -> Self {
        Self {
            permissions,
            roles,
            tenants,
            cache,
        }
    }

    /// Insert any catalog key absent from storage. Idempotent and safe
    /// to run on every startup. Callers treat failure as best-effort: a
    /// partial catalog degrades to "permission not found, deny".
    pub async fn ensure_catalog(&self) -> GatehouseResult<u64> {
        let existing: HashSet<String> = self
            .permissions
            .list()
            .await?
            .into_iter()
            .map(|p| p.key)
            .collect();

        let missing: Vec<CreatePermission> = PERMISSION_KEYS
            .iter()
            .filter(|key| !existing.contains(**key))
            .map(|key| CreatePermission {
                key: key.to_string(),
                description: catalog::describe(key),
            })
            .collect();

        if missing.is_empty() {
            return Ok(0);
        }
        let created = self.permissions.create_missing(&missing).await?;
        info!(created, "seeded missing catalog permissions");
        Ok(created)
    }

    /// Reconcile the default roles for one tenant: create each missing
    /// role with its full permission set; for existing roles, add only
    /// the permissions they lack. Grants added by hand stay untouched.
    /// Idempotent, safe to run repeatedly and concurrently across
    /// tenants.
    pub async fn reconcile_default_roles(&self, tenant_id: Uuid) -> GatehouseResult<()> {
        let key_to_id: HashMap<String, Uuid> = self
            .permissions
            .list()
            .await?
            .into_iter()
            .map(|p| (p.key, p.id))
            .collect();

        let existing = self.roles.list_with_permissions(tenant_id).await?;
        let by_key: HashMap<&str, &RoleWithPermissions> = existing
            .iter()
            .map(|r| (r.role.key.as_str(), r))
            .collect();

        for def in DEFAULT_ROLES {
            match by_key.get(def.key) {
                Some(existing) => {
                    let held: HashSet<Uuid> =
                        existing.permissions.iter().map(|p| p.id).collect();
                    let to_add: Vec<Uuid> = def
                        .permissions
                        .iter()
                        .filter_map(|k| key_to_id.get(*k).copied())
                        .filter(|id| !held.contains(id))
                        .collect();
                    if !to_add.is_empty() {
                        self.roles
                            .grant_permissions(tenant_id, existing.role.id, &to_add)
                            .await?;
                    }
                }
                None => {
                    let role = self
                        .roles
                        .create(CreateRole {
                            tenant_id,
                            key: def.key.into(),
                            name: def.name.into(),
                            description: def.description.into(),
                        })
                        .await?;
                    let perm_ids: Vec<Uuid> = def
                        .permissions
                        .iter()
                        .filter_map(|k| key_to_id.get(*k).copied())
                        .collect();
                    if !perm_ids.is_empty() {
                        self.roles
                            .grant_permissions(tenant_id, role.id, &perm_ids)
                            .await?;
                    }
                }
            }
        }

        // The cached listing must never outlive a reconciliation write.
        if let Err(e) = self.cache.delete(&roles_key(tenant_id)).await {
            warn!(tenant_id = %tenant_id, error = %e, "failed to invalidate role cache after reconciliation");
        }
        Ok(())
    }

    /// Reconcile every tenant, in small concurrent batches. One
    /// tenant's failure is logged and never aborts the rest.
    pub async fn reconcile_all_tenants(&self) -> GatehouseResult<()> {
        let tenant_ids = self.tenants.list_ids().await?;

        for batch in tenant_ids.chunks(RECONCILE_BATCH_SIZE) {
            let results = join_all(
                batch
                    .iter()
                    .map(|&tenant_id| self.reconcile_default_roles(tenant_id)),
            )
            .await;
            for (tenant_id, result) in batch.iter().zip(results) {
                if let Err(e) = result {
                    warn!(tenant_id = %tenant_id, error = %e, "default role reconciliation failed");
                }
            }
        }
        Ok(())
    }

    /// All roles with their permissions for a tenant, cache-first.
    pub async fn roles_for_tenant(
        &self,
        tenant_id: Uuid,
    ) -> GatehouseResult<Vec<RoleWithPermissions>> {
        let key = roles_key(tenant_id);
        match self.cache.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(roles) => return Ok(roles),
                Err(e) => {
                    warn!(tenant_id = %tenant_id, error = %e, "discarding undecodable role cache entry");
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(tenant_id = %tenant_id, error = %e, "role cache read failed; falling back to storage");
            }
        }

        let roles = self.roles.list_with_permissions(tenant_id).await?;

        let encoded = serde_json::to_vec(&roles)
            .map_err(|e| GatehouseError::Internal(format!("role cache encode: {e}")))?;
        if let Err(e) = self.cache.set(&key, &encoded, ROLES_CACHE_TTL).await {
            warn!(tenant_id = %tenant_id, error = %e, "role cache write failed");
        }
        Ok(roles)
    }
}
