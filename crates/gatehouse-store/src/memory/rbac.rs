//! Role and permission repositories over the in-memory store.

use chrono::Utc;
use uuid::Uuid;

use gatehouse_core::models::permission::{CreatePermission, Permission};
use gatehouse_core::models::role::{CreateRole, Role, RoleWithPermissions};
use gatehouse_core::repository::{PermissionRepository, RoleRepository};
use gatehouse_core::{GatehouseError, GatehouseResult};

use super::MemStore;

impl RoleRepository for MemStore {
    async fn create(&self, input: CreateRole) -> GatehouseResult<Role> {
        self.tenant(input.tenant_id)?;
        if self
            .db
            .roles
            .iter()
            .any(|r| r.tenant_id == input.tenant_id && r.key == input.key)
        {
            return Err(GatehouseError::Validation {
                message: format!("role key '{}' already exists in this tenant", input.key),
            });
        }
        let now = Utc::now();
        let role = Role {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            key: input.key,
            name: input.name,
            description: input.description,
            created_at: now,
            updated_at: now,
        };
        self.db.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn get_by_key(&self, tenant_id: Uuid, key: &str) -> GatehouseResult<RoleWithPermissions> {
        let role_id = self
            .db
            .roles
            .iter()
            .find(|r| r.tenant_id == tenant_id && r.key == key)
            .map(|r| r.id)
            .ok_or_else(|| GatehouseError::not_found("role"))?;
        self.role_with_permissions(role_id)
            .ok_or_else(|| GatehouseError::not_found("role"))
    }

    async fn list_with_permissions(
        &self,
        tenant_id: Uuid,
    ) -> GatehouseResult<Vec<RoleWithPermissions>> {
        let mut role_ids: Vec<(String, Uuid)> = self
            .db
            .roles
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .map(|r| (r.key.clone(), r.id))
            .collect();
        role_ids.sort();
        Ok(role_ids
            .into_iter()
            .filter_map(|(_, id)| self.role_with_permissions(id))
            .collect())
    }

    async fn grant_permissions(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> GatehouseResult<u64> {
        let role_tenant = self
            .db
            .roles
            .get(&role_id)
            .map(|r| r.tenant_id)
            .ok_or_else(|| GatehouseError::not_found("role"))?;
        if role_tenant != tenant_id {
            return Err(GatehouseError::not_found("role"));
        }
        let mut grants = self.db.role_grants.entry(role_id).or_default();
        let mut added = 0;
        for pid in permission_ids {
            if !grants.contains(pid) {
                grants.push(*pid);
                added += 1;
            }
        }
        Ok(added)
    }
}

impl PermissionRepository for MemStore {
    async fn list(&self) -> GatehouseResult<Vec<Permission>> {
        let mut all: Vec<Permission> = self.db.permissions.iter().map(|p| p.clone()).collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(all)
    }

    async fn create_missing(&self, entries: &[CreatePermission]) -> GatehouseResult<u64> {
        let mut inserted = 0;
        for entry in entries {
            if self.db.permissions.iter().any(|p| p.key == entry.key) {
                continue;
            }
            let permission = Permission {
                id: Uuid::new_v4(),
                key: entry.key.clone(),
                description: entry.description.clone(),
                created_at: Utc::now(),
            };
            self.db.permissions.insert(permission.id, permission);
            inserted += 1;
        }
        Ok(inserted)
    }
}
