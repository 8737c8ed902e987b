//! Catalog seeding and default-role reconciliation against the
//! in-memory store.

use std::collections::HashSet;

use gatehouse_core::models::tenant::{CreateTenant, Tenant};
use gatehouse_core::repository::{RoleRepository, TenantRepository};
use gatehouse_rbac::service::RbacService;
use gatehouse_rbac::{DEFAULT_ROLES, PERMISSION_KEYS};
use gatehouse_store::{InMemoryCache, MemStore};

fn service(store: &MemStore) -> RbacService<MemStore, MemStore, MemStore, InMemoryCache> {
    RbacService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        InMemoryCache::new(),
    )
}

async fn seed_tenant(store: &MemStore, slug: &str) -> Tenant {
    TenantRepository::create(
        store,
        CreateTenant {
            name: slug.into(),
            slug: slug.into(),
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn catalog_seeding_is_idempotent() {
    let store = MemStore::new();
    let rbac = service(&store);

    assert_eq!(
        rbac.ensure_catalog().await.unwrap(),
        PERMISSION_KEYS.len() as u64
    );
    assert_eq!(rbac.ensure_catalog().await.unwrap(), 0);
}

#[tokio::test]
async fn fresh_tenant_gets_every_default_role() {
    let store = MemStore::new();
    let rbac = service(&store);
    let tenant = seed_tenant(&store, "riverside-towers").await;

    rbac.ensure_catalog().await.unwrap();
    rbac.reconcile_default_roles(tenant.id).await.unwrap();

    let roles = rbac.roles_for_tenant(tenant.id).await.unwrap();
    assert_eq!(roles.len(), DEFAULT_ROLES.len());

    for def in DEFAULT_ROLES {
        let role = roles.iter().find(|r| r.role.key == def.key).unwrap();
        let held: HashSet<&str> = role.permissions.iter().map(|p| p.key.as_str()).collect();
        for key in def.permissions {
            assert!(held.contains(key), "{} missing {key}", def.key);
        }
        assert_eq!(held.len(), def.permissions.len());
    }
}

#[tokio::test]
async fn reconciling_twice_changes_nothing() {
    let store = MemStore::new();
    let rbac = service(&store);
    let tenant = seed_tenant(&store, "riverside-towers").await;

    rbac.ensure_catalog().await.unwrap();
    rbac.reconcile_default_roles(tenant.id).await.unwrap();
    let first = rbac.roles_for_tenant(tenant.id).await.unwrap();

    rbac.reconcile_default_roles(tenant.id).await.unwrap();
    let second = rbac.roles_for_tenant(tenant.id).await.unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.role.id, b.role.id);
        let keys_a: HashSet<&str> = a.permissions.iter().map(|p| p.key.as_str()).collect();
        let keys_b: HashSet<&str> = b.permissions.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys_a, keys_b);
    }
}

#[tokio::test]
async fn hand_added_grants_survive_reconciliation() {
    let store = MemStore::new();
    let rbac = service(&store);
    let tenant = seed_tenant(&store, "riverside-towers").await;

    rbac.ensure_catalog().await.unwrap();
    rbac.reconcile_default_roles(tenant.id).await.unwrap();

    // Grant the resident role a permission it does not hold by default.
    let resident = store.get_by_key(tenant.id, "resident").await.unwrap();
    let catalog = gatehouse_core::repository::PermissionRepository::list(&store)
        .await
        .unwrap();
    let extra = catalog.iter().find(|p| p.key == "calendar.view").unwrap();
    store
        .grant_permissions(tenant.id, resident.role.id, &[extra.id])
        .await
        .unwrap();

    rbac.reconcile_default_roles(tenant.id).await.unwrap();

    let resident = store.get_by_key(tenant.id, "resident").await.unwrap();
    assert!(
        resident.permissions.iter().any(|p| p.key == "calendar.view"),
        "hand-added grant was removed"
    );
}

#[tokio::test]
async fn removed_default_grant_is_restored() {
    let store = MemStore::new();
    let rbac = service(&store);
    let tenant = seed_tenant(&store, "riverside-towers").await;

    rbac.ensure_catalog().await.unwrap();

    // Pre-create the security role with a single permission; the
    // reconciler must top it up to the full default set.
    let catalog = gatehouse_core::repository::PermissionRepository::list(&store)
        .await
        .unwrap();
    let view = catalog.iter().find(|p| p.key == "visit.view").unwrap();
    let role = RoleRepository::create(
        &store,
        gatehouse_core::models::role::CreateRole {
            tenant_id: tenant.id,
            key: "security".into(),
            name: "Security".into(),
            description: String::new(),
        },
    )
    .await
    .unwrap();
    store
        .grant_permissions(tenant.id, role.id, &[view.id])
        .await
        .unwrap();

    rbac.reconcile_default_roles(tenant.id).await.unwrap();

    let security = store.get_by_key(tenant.id, "security").await.unwrap();
    let def = DEFAULT_ROLES.iter().find(|d| d.key == "security").unwrap();
    assert_eq!(security.role.id, role.id, "role was recreated, not topped up");
    assert_eq!(security.permissions.len(), def.permissions.len());
}

#[tokio::test]
async fn reconcile_all_tenants_covers_more_than_one_batch() {
    let store = MemStore::new();
    let rbac = service(&store);
    rbac.ensure_catalog().await.unwrap();

    let mut tenant_ids = Vec::new();
    for i in 0..7 {
        tenant_ids.push(seed_tenant(&store, &format!("tenant-{i}")).await.id);
    }

    rbac.reconcile_all_tenants().await.unwrap();

    for id in tenant_ids {
        let roles = rbac.roles_for_tenant(id).await.unwrap();
        assert_eq!(roles.len(), DEFAULT_ROLES.len());
    }
}

#[tokio::test]
async fn role_listing_reflects_reconciliation_despite_cache() {
    let store = MemStore::new();
    let rbac = service(&store);
    let tenant = seed_tenant(&store, "riverside-towers").await;
    rbac.ensure_catalog().await.unwrap();

    // Populate the cache with the empty listing first.
    assert!(rbac.roles_for_tenant(tenant.id).await.unwrap().is_empty());

    rbac.reconcile_default_roles(tenant.id).await.unwrap();

    // Reconciliation invalidated the entry, so the listing is fresh.
    let roles = rbac.roles_for_tenant(tenant.id).await.unwrap();
    assert_eq!(roles.len(), DEFAULT_ROLES.len());
}
