//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped methods require a
//! `tenant_id` parameter to enforce data isolation; an entity that
//! exists in another tenant is reported as `NotFound`, identically to
//! one that does not exist at all.
//!
//! The only reads not keyed by tenant are lookups by globally-unique
//! principal or visit id, used by flows that start from a verified
//! token rather than a tenant context (session refresh, tenant switch,
//! public pass scan).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::GatehouseResult;
use crate::models::{
    permission::{CreatePermission, Permission},
    principal::{CreatePrincipal, Liveness, Principal, PrincipalProfile},
    role::{CreateRole, Role, RoleWithPermissions},
    tenant::{CreateTenant, Tenant, TenantSummary},
    visit::{CreateVisit, Visit, VisitDetails, VisitFilter, VisitStatus},
    visitor::{CreateVisitor, Visitor},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = GatehouseResult<Tenant>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GatehouseResult<Tenant>> + Send;

    /// Ids of every tenant, for all-tenant reconciliation.
    fn list_ids(&self) -> impl Future<Output = GatehouseResult<Vec<Uuid>>> + Send;

    fn set_active(
        &self,
        id: Uuid,
        active: bool,
    ) -> impl Future<Output = GatehouseResult<Tenant>> + Send;
}

pub trait PrincipalRepository: Send + Sync {
    fn create(
        &self,
        input: CreatePrincipal,
    ) -> impl Future<Output = GatehouseResult<Principal>> + Send;

    /// Lookup by globally-unique id, used by token-anchored flows
    /// (refresh, tenant switch) where the id comes from verified claims.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GatehouseResult<Principal>> + Send;

    fn get_in_tenant(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GatehouseResult<Principal>> + Send;

    /// Full profile (tenant context + roles + permissions) by id,
    /// regardless of active flags — callers check them.
    fn profile_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = GatehouseResult<PrincipalProfile>> + Send;

    /// First *active* principal record with this email. The profile's
    /// `tenant_active` flag still needs checking by the caller.
    fn active_profile_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = GatehouseResult<PrincipalProfile>> + Send;

    /// Active principal with this email in the given tenant, where the
    /// tenant is itself active. `NotFound` covers every other case.
    fn active_profile_by_email_in_tenant(
        &self,
        email: &str,
        tenant_id: Uuid,
    ) -> impl Future<Output = GatehouseResult<PrincipalProfile>> + Send;

    /// The two liveness booleans, and nothing else — this backs the
    /// per-request validation path, keep it cheap. A missing principal
    /// reads as inactive.
    fn liveness(&self, id: Uuid) -> impl Future<Output = GatehouseResult<Liveness>> + Send;

    /// Active tenants in which this email has an active principal,
    /// ordered by tenant name.
    fn tenants_for_email(
        &self,
        email: &str,
    ) -> impl Future<Output = GatehouseResult<Vec<TenantSummary>>> + Send;

    fn set_active(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        active: bool,
    ) -> impl Future<Output = GatehouseResult<Principal>> + Send;

    fn assign_role(
        &self,
        tenant_id: Uuid,
        principal_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = GatehouseResult<()>> + Send;
}

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = GatehouseResult<Role>> + Send;

    fn get_by_key(
        &self,
        tenant_id: Uuid,
        key: &str,
    ) -> impl Future<Output = GatehouseResult<RoleWithPermissions>> + Send;

    fn list_with_permissions(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = GatehouseResult<Vec<RoleWithPermissions>>> + Send;

    /// Add permission links that are not already present; existing
    /// links are never removed. Returns the number added.
    fn grant_permissions(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> impl Future<Output = GatehouseResult<u64>> + Send;
}

pub trait PermissionRepository: Send + Sync {
    fn list(&self) -> impl Future<Output = GatehouseResult<Vec<Permission>>> + Send;

    /// Insert-if-missing for catalog seeding; returns the number
    /// actually inserted.
    fn create_missing(
        &self,
        entries: &[CreatePermission],
    ) -> impl Future<Output = GatehouseResult<u64>> + Send;
}

pub trait VisitorRepository: Send + Sync {
    fn create(
        &self,
        input: CreateVisitor,
    ) -> impl Future<Output = GatehouseResult<Visitor>> + Send;

    fn get(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GatehouseResult<Visitor>> + Send;

    /// Paginated listing with optional case-insensitive search over
    /// name, email, company, and document id.
    fn list(
        &self,
        tenant_id: Uuid,
        search: Option<&str>,
        pagination: Pagination,
    ) -> impl Future<Output = GatehouseResult<PaginatedResult<Visitor>>> + Send;
}

pub trait VisitRepository: Send + Sync {
    fn create(&self, input: CreateVisit) -> impl Future<Output = GatehouseResult<Visit>> + Send;

    fn get(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GatehouseResult<Visit>> + Send;

    fn details(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = GatehouseResult<VisitDetails>> + Send;

    /// Lookup by id alone, for the public scan path where the caller
    /// holds a verified capability token binding this id and no tenant
    /// context exists yet.
    fn get_for_pass(&self, id: Uuid) -> impl Future<Output = GatehouseResult<Visit>> + Send;

    /// Compare-and-swap status transition. Fails with `StateConflict`
    /// when the current status is not `from` — implementations must
    /// make the update conditional (e.g. `UPDATE .. WHERE status = $from`)
    /// and report zero affected rows as the conflict, never as success.
    ///
    /// Sets `check_in_at` when `to` is `CheckedIn` and `check_out_at`
    /// when `to` is `CheckedOut`, both to `at`.
    fn transition(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        from: VisitStatus,
        to: VisitStatus,
        at: DateTime<Utc>,
    ) -> impl Future<Output = GatehouseResult<Visit>> + Send;

    /// Persist a generated pass token and its rendered artifact.
    fn store_pass(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        token: &str,
        artifact: &str,
    ) -> impl Future<Output = GatehouseResult<Visit>> + Send;

    /// Visit history, newest first.
    fn list(
        &self,
        tenant_id: Uuid,
        filter: VisitFilter,
        pagination: Pagination,
    ) -> impl Future<Output = GatehouseResult<PaginatedResult<VisitDetails>>> + Send;

    /// All visits currently `checked_in`, most recent check-in first.
    fn list_active(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = GatehouseResult<Vec<VisitDetails>>> + Send;
}
