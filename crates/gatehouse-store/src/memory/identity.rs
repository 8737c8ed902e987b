//! Tenant and principal repositories over the in-memory store.

use chrono::Utc;
use uuid::Uuid;

use gatehouse_core::models::principal::{CreatePrincipal, Liveness, Principal, PrincipalProfile};
use gatehouse_core::models::tenant::{CreateTenant, Tenant, TenantSummary};
use gatehouse_core::repository::{PrincipalRepository, TenantRepository};
use gatehouse_core::{GatehouseError, GatehouseResult};

use super::MemStore;

impl TenantRepository for MemStore {
    async fn create(&self, input: CreateTenant) -> GatehouseResult<Tenant> {
        if self.db.tenants.iter().any(|t| t.slug == input.slug) {
            return Err(GatehouseError::Validation {
                message: format!("tenant slug '{}' already in use", input.slug),
            });
        }
        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: input.name,
            slug: input.slug,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.db.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn get_by_id(&self, id: Uuid) -> GatehouseResult<Tenant> {
        self.tenant(id)
    }

    async fn list_ids(&self) -> GatehouseResult<Vec<Uuid>> {
        Ok(self.db.tenants.iter().map(|t| t.id).collect())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> GatehouseResult<Tenant> {
        let mut tenant = self
            .db
            .tenants
            .get_mut(&id)
            .ok_or_else(|| GatehouseError::not_found("tenant"))?;
        tenant.is_active = active;
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }
}

impl PrincipalRepository for MemStore {
    async fn create(&self, input: CreatePrincipal) -> GatehouseResult<Principal> {
        self.tenant(input.tenant_id)?;
        let email = input.email.to_lowercase();
        if self
            .db
            .principals
            .iter()
            .any(|p| p.tenant_id == input.tenant_id && p.email == email)
        {
            return Err(GatehouseError::Validation {
                message: format!("email '{email}' already registered in this tenant"),
            });
        }
        let now = Utc::now();
        let principal = Principal {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            email,
            password_hash: input.password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            is_active: true,
            is_super_admin: input.is_super_admin,
            created_at: now,
            updated_at: now,
        };
        self.db.principals.insert(principal.id, principal.clone());
        Ok(principal)
    }

    async fn get_by_id(&self, id: Uuid) -> GatehouseResult<Principal> {
        self.principal(id)
    }

    async fn get_in_tenant(&self, tenant_id: Uuid, id: Uuid) -> GatehouseResult<Principal> {
        let principal = self.principal(id)?;
        if principal.tenant_id != tenant_id {
            return Err(GatehouseError::not_found("principal"));
        }
        Ok(principal)
    }

    async fn profile_by_id(&self, id: Uuid) -> GatehouseResult<PrincipalProfile> {
        let principal = self.principal(id)?;
        self.assemble_profile(principal)
    }

    async fn active_profile_by_email(&self, email: &str) -> GatehouseResult<PrincipalProfile> {
        let mut candidates: Vec<Principal> = self
            .db
            .principals
            .iter()
            .filter(|p| p.is_active && p.email.eq_ignore_ascii_case(email))
            .map(|p| p.clone())
            .collect();
        // Deterministic "first" across matches in multiple tenants.
        candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let principal = candidates
            .into_iter()
            .next()
            .ok_or_else(|| GatehouseError::not_found("principal"))?;
        self.assemble_profile(principal)
    }

    async fn active_profile_by_email_in_tenant(
        &self,
        email: &str,
        tenant_id: Uuid,
    ) -> GatehouseResult<PrincipalProfile> {
        let principal = self
            .db
            .principals
            .iter()
            .find(|p| {
                p.is_active && p.tenant_id == tenant_id && p.email.eq_ignore_ascii_case(email)
            })
            .map(|p| p.clone())
            .ok_or_else(|| GatehouseError::not_found("principal"))?;
        let profile = self.assemble_profile(principal)?;
        if !profile.tenant_active {
            return Err(GatehouseError::not_found("principal"));
        }
        Ok(profile)
    }

    async fn liveness(&self, id: Uuid) -> GatehouseResult<Liveness> {
        let Some(principal) = self.db.principals.get(&id).map(|p| p.clone()) else {
            return Ok(Liveness {
                principal_active: false,
                tenant_active: false,
            });
        };
        let tenant_active = self
            .db
            .tenants
            .get(&principal.tenant_id)
            .map(|t| t.is_active)
            .unwrap_or(false);
        Ok(Liveness {
            principal_active: principal.is_active,
            tenant_active,
        })
    }

    async fn tenants_for_email(&self, email: &str) -> GatehouseResult<Vec<TenantSummary>> {
        let tenant_ids: Vec<Uuid> = self
            .db
            .principals
            .iter()
            .filter(|p| p.is_active && p.email.eq_ignore_ascii_case(email))
            .map(|p| p.tenant_id)
            .collect();
        let mut summaries: Vec<TenantSummary> = tenant_ids
            .into_iter()
            .filter_map(|id| self.db.tenants.get(&id).map(|t| t.clone()))
            .filter(|t| t.is_active)
            .map(|t| TenantSummary {
                id: t.id,
                name: t.name,
                slug: t.slug,
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    async fn set_active(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        active: bool,
    ) -> GatehouseResult<Principal> {
        let mut principal = self
            .db
            .principals
            .get_mut(&id)
            .ok_or_else(|| GatehouseError::not_found("principal"))?;
        if principal.tenant_id != tenant_id {
            return Err(GatehouseError::not_found("principal"));
        }
        principal.is_active = active;
        principal.updated_at = Utc::now();
        Ok(principal.clone())
    }

    async fn assign_role(
        &self,
        tenant_id: Uuid,
        principal_id: Uuid,
        role_id: Uuid,
    ) -> GatehouseResult<()> {
        self.get_in_tenant(tenant_id, principal_id).await?;
        let role_tenant = self
            .db
            .roles
            .get(&role_id)
            .map(|r| r.tenant_id)
            .ok_or_else(|| GatehouseError::not_found("role"))?;
        if role_tenant != tenant_id {
            return Err(GatehouseError::not_found("role"));
        }
        let mut assigned = self.db.principal_roles.entry(principal_id).or_default();
        if !assigned.contains(&role_id) {
            assigned.push(role_id);
        }
        Ok(())
    }
}
