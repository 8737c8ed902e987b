//! End-to-end session flows against the in-memory store: login,
//! liveness revocation, claim staleness, and tenant switching.

use gatehouse_auth::config::AuthConfig;
use gatehouse_auth::password;
use gatehouse_auth::service::SessionService;
use gatehouse_core::GatehouseError;
use gatehouse_core::models::principal::{CreatePrincipal, Principal};
use gatehouse_core::models::role::CreateRole;
use gatehouse_core::models::tenant::{CreateTenant, Tenant};
use gatehouse_core::repository::{
    PermissionRepository, PrincipalRepository, RoleRepository, TenantRepository,
};
use gatehouse_store::{InMemoryCache, MemStore};

const PASSWORD: &str = "correct horse battery staple";

fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-test-secret".into(),
        ..AuthConfig::default()
    }
}

fn service(store: &MemStore) -> SessionService<MemStore, InMemoryCache> {
    SessionService::new(store.clone(), InMemoryCache::new(), test_config())
}

async fn seed_tenant(store: &MemStore, name: &str, slug: &str) -> Tenant {
    TenantRepository::create(
        store,
        CreateTenant {
            name: name.into(),
            slug: slug.into(),
        },
    )
    .await
    .unwrap()
}

async fn seed_principal(store: &MemStore, tenant_id: uuid::Uuid, email: &str) -> Principal {
    PrincipalRepository::create(
        store,
        CreatePrincipal {
            tenant_id,
            email: email.into(),
            password_hash: password::hash_password(PASSWORD).unwrap(),
            first_name: "Rita".into(),
            last_name: "Okafor".into(),
            is_super_admin: false,
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn login_issues_token_with_profile() {
    let store = MemStore::new();
    let tenant = seed_tenant(&store, "Riverside Towers", "riverside-towers").await;
    let principal = seed_principal(&store, tenant.id, "rita@example.com").await;
    let sessions = service(&store);

    // Email matching is case-insensitive at login.
    let out = sessions
        .login("Rita@Example.COM", PASSWORD, false)
        .await
        .unwrap();
    assert!(!out.token.is_empty());
    assert_eq!(out.profile.id, principal.id);
    assert_eq!(out.profile.email, "rita@example.com");
    assert_eq!(out.profile.tenant_id, tenant.id);
    assert_eq!(out.profile.tenant_name, "Riverside Towers");
    assert!(out.profile.roles.is_empty());

    let claims = sessions.validate(&out.token).await.unwrap();
    assert_eq!(claims.principal_id().unwrap(), principal.id);
    assert_eq!(claims.tenant_uuid().unwrap(), tenant.id);
}

#[tokio::test]
async fn wrong_password_is_generic_unauthorized() {
    let store = MemStore::new();
    let tenant = seed_tenant(&store, "Riverside Towers", "riverside-towers").await;
    seed_principal(&store, tenant.id, "rita@example.com").await;
    let sessions = service(&store);

    let err = sessions
        .login("rita@example.com", "not the password", false)
        .await
        .unwrap_err();
    assert!(matches!(err, GatehouseError::AuthenticationFailed { .. }));
    // Indistinguishable from an unknown email.
    assert_eq!(err.to_string(), "unauthorized");
    let err = sessions
        .login("nobody@example.com", PASSWORD, false)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "unauthorized");
}

#[tokio::test]
async fn inactive_principal_cannot_login() {
    let store = MemStore::new();
    let tenant = seed_tenant(&store, "Riverside Towers", "riverside-towers").await;
    let principal = seed_principal(&store, tenant.id, "rita@example.com").await;
    PrincipalRepository::set_active(&store, tenant.id, principal.id, false)
        .await
        .unwrap();
    let sessions = service(&store);

    let err = sessions
        .login("rita@example.com", PASSWORD, false)
        .await
        .unwrap_err();
    assert!(matches!(err, GatehouseError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn inactive_tenant_blocks_login_even_with_valid_password() {
    let store = MemStore::new();
    let tenant = seed_tenant(&store, "Riverside Towers", "riverside-towers").await;
    seed_principal(&store, tenant.id, "rita@example.com").await;
    TenantRepository::set_active(&store, tenant.id, false)
        .await
        .unwrap();
    let sessions = service(&store);

    let err = sessions
        .login("rita@example.com", PASSWORD, false)
        .await
        .unwrap_err();
    assert!(matches!(err, GatehouseError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn deactivation_is_observable_after_invalidate() {
    let store = MemStore::new();
    let tenant = seed_tenant(&store, "Riverside Towers", "riverside-towers").await;
    let principal = seed_principal(&store, tenant.id, "rita@example.com").await;
    let sessions = service(&store);

    let out = sessions
        .login("rita@example.com", PASSWORD, false)
        .await
        .unwrap();
    // Prime the liveness cache.
    sessions.validate(&out.token).await.unwrap();

    PrincipalRepository::set_active(&store, tenant.id, principal.id, false)
        .await
        .unwrap();
    // Still authorized: the cached liveness answer has not expired.
    sessions.validate(&out.token).await.unwrap();

    sessions.invalidate(principal.id).await.unwrap();
    let err = sessions.validate(&out.token).await.unwrap_err();
    assert!(matches!(err, GatehouseError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn claims_stay_stale_until_refresh() {
    let store = MemStore::new();
    let tenant = seed_tenant(&store, "Riverside Towers", "riverside-towers").await;
    let principal = seed_principal(&store, tenant.id, "rita@example.com").await;
    let sessions = service(&store);

    let out = sessions
        .login("rita@example.com", PASSWORD, false)
        .await
        .unwrap();
    assert!(out.profile.permissions.is_empty());

    // Grant a role after the token was minted.
    PermissionRepository::create_missing(
        &store,
        &[gatehouse_core::models::permission::CreatePermission {
            key: "visit.view".into(),
            description: "visit view".into(),
        }],
    )
    .await
    .unwrap();
    let perm_id = store.list().await.unwrap()[0].id;
    let role = RoleRepository::create(
        &store,
        CreateRole {
            tenant_id: tenant.id,
            key: "security".into(),
            name: "Security".into(),
            description: String::new(),
        },
    )
    .await
    .unwrap();
    store
        .grant_permissions(tenant.id, role.id, &[perm_id])
        .await
        .unwrap();
    store
        .assign_role(tenant.id, principal.id, role.id)
        .await
        .unwrap();

    // The old token still carries the issuance-time snapshot.
    let claims = sessions.validate(&out.token).await.unwrap();
    assert!(!claims.has_permission("visit.view"));

    // Refresh re-reads storage and mints the new snapshot.
    let refreshed = sessions.refresh(principal.id).await.unwrap();
    assert_eq!(refreshed.profile.roles, vec!["security"]);
    let claims = sessions.validate(&refreshed.token).await.unwrap();
    assert!(claims.has_permission("visit.view"));
}

#[tokio::test]
async fn switch_tenant_reissues_for_sibling() {
    let store = MemStore::new();
    let home = seed_tenant(&store, "Riverside Towers", "riverside-towers").await;
    let away = seed_tenant(&store, "Cedar Court", "cedar-court").await;
    let principal = seed_principal(&store, home.id, "rita@example.com").await;
    let sibling = seed_principal(&store, away.id, "rita@example.com").await;
    let sessions = service(&store);

    let out = sessions
        .switch_tenant(principal.id, away.id)
        .await
        .unwrap();
    assert_eq!(out.profile.tenant_id, away.id);
    assert_eq!(out.profile.id, sibling.id);
}

#[tokio::test]
async fn switch_without_sibling_is_denied_not_missing() {
    let store = MemStore::new();
    let home = seed_tenant(&store, "Riverside Towers", "riverside-towers").await;
    let away = seed_tenant(&store, "Cedar Court", "cedar-court").await;
    let principal = seed_principal(&store, home.id, "rita@example.com").await;
    let sessions = service(&store);

    let err = sessions
        .switch_tenant(principal.id, away.id)
        .await
        .unwrap_err();
    // Denial, so the response never reveals whether the tenant exists.
    assert!(matches!(err, GatehouseError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn accessible_tenants_lists_active_sorted_by_name() {
    let store = MemStore::new();
    let birch = seed_tenant(&store, "Birch Gardens", "birch-gardens").await;
    let acacia = seed_tenant(&store, "Acacia Heights", "acacia-heights").await;
    let cedar = seed_tenant(&store, "Cedar Court", "cedar-court").await;
    let principal = seed_principal(&store, birch.id, "rita@example.com").await;
    seed_principal(&store, acacia.id, "rita@example.com").await;
    seed_principal(&store, cedar.id, "rita@example.com").await;
    TenantRepository::set_active(&store, cedar.id, false)
        .await
        .unwrap();
    let sessions = service(&store);

    let tenants = sessions.accessible_tenants(principal.id).await.unwrap();
    let names: Vec<&str> = tenants.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Acacia Heights", "Birch Gardens"]);
}
