//! Session service — login, refresh, tenant switching, and the
//! per-request validation fast path.

use std::time::Duration;

use tracing::warn;
use uuid::Uuid;

use gatehouse_core::cache::Cache;
use gatehouse_core::models::principal::PrincipalProfile;
use gatehouse_core::models::tenant::TenantSummary;
use gatehouse_core::repository::PrincipalRepository;
use gatehouse_core::{GatehouseError, GatehouseResult};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::{self, SessionClaims};

/// Flat view of the authenticated principal returned alongside a fresh
/// token.
#[derive(Debug, Clone)]
pub struct SessionProfile {
    pub id: Uuid,
    pub email: String,
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub first_name: String,
    pub last_name: String,
    pub is_super_admin: bool,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

/// Successful login/refresh/switch result.
#[derive(Debug, Clone)]
pub struct SessionOutput {
    /// Signed session token.
    pub token: String,
    pub profile: SessionProfile,
}

/// Session service.
///
/// Generic over the principal repository and cache so that this crate
/// has no dependency on any storage implementation.
pub struct SessionService<P: PrincipalRepository, C: Cache> {
    principals: P,
    cache: C,
    config: AuthConfig,
}

/// Liveness cache key for a principal.
pub fn liveness_key(principal_id: Uuid) -> String {
    format!("session:active:{principal_id}")
}

impl<P: PrincipalRepository, C: Cache> SessionService<P, C> {
    pub fn new(principals: P, cache: C, config: AuthConfig) -> Self {
        Self {
            principals,
            cache,
            config,
        }
    }

    /// Authenticate with email + password and issue a session token.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> GatehouseResult<SessionOutput> {
        let profile = self.validate_credentials(email, password).await?;
        self.issue(&profile, remember_me)
    }

    /// Look up an active principal by email whose tenant is also
    /// active, then verify the password. Fails closed on an inactive
    /// tenant even if the password would match.
    pub async fn validate_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> GatehouseResult<PrincipalProfile> {
        let profile = self
            .principals
            .active_profile_by_email(&email.to_lowercase())
            .await
            .map_err(|e| match e {
                GatehouseError::NotFound { .. } => AuthError::InvalidCredentials.into(),
                other => other,
            })?;

        if !profile.tenant_active {
            return Err(AuthError::TenantInactive.into());
        }

        if !password::verify_password(password, &profile.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(profile)
    }

    /// Sign a token carrying the profile's current role/permission
    /// snapshot.
    pub fn issue(
        &self,
        profile: &PrincipalProfile,
        remember_me: bool,
    ) -> GatehouseResult<SessionOutput> {
        let token = token::issue_session_token(profile, remember_me, &self.config)?;
        Ok(SessionOutput {
            token,
            profile: SessionProfile {
                id: profile.id,
                email: profile.email.clone(),
                tenant_id: profile.tenant_id,
                tenant_name: profile.tenant_name.clone(),
                first_name: profile.first_name.clone(),
                last_name: profile.last_name.clone(),
                is_super_admin: profile.is_super_admin,
                roles: profile.role_keys(),
                permissions: profile.permission_keys(),
            },
        })
    }

    /// Re-read the principal and its roles from storage and re-issue.
    /// This is the only way a permission change becomes visible to an
    /// already-issued token.
    pub async fn refresh(&self, principal_id: Uuid) -> GatehouseResult<SessionOutput> {
        let profile = self
            .principals
            .profile_by_id(principal_id)
            .await
            .map_err(|e| match e {
                GatehouseError::NotFound { .. } => AuthError::InvalidCredentials.into(),
                other => other,
            })?;
        if !profile.is_active {
            return Err(AuthError::PrincipalInactive.into());
        }
        if !profile.tenant_active {
            return Err(AuthError::TenantInactive.into());
        }
        self.issue(&profile, false)
    }

    /// Active tenants where this principal's email has an active
    /// sibling record, for the tenant switcher.
    pub async fn accessible_tenants(
        &self,
        principal_id: Uuid,
    ) -> GatehouseResult<Vec<TenantSummary>> {
        let principal = self
            .principals
            .get_by_id(principal_id)
            .await
            .map_err(|e| match e {
                GatehouseError::NotFound { .. } => AuthError::InvalidCredentials.into(),
                other => other,
            })?;
        self.principals.tenants_for_email(&principal.email).await
    }

    /// Switch to another tenant by resolving the sibling principal with
    /// the same email there. Denied — not "not found" — when no active
    /// sibling exists, so tenant existence never leaks.
    pub async fn switch_tenant(
        &self,
        principal_id: Uuid,
        target_tenant_id: Uuid,
    ) -> GatehouseResult<SessionOutput> {
        let current = self
            .principals
            .get_by_id(principal_id)
            .await
            .map_err(|e| match e {
                GatehouseError::NotFound { .. } => AuthError::InvalidCredentials.into(),
                other => other,
            })?;

        let sibling = self
            .principals
            .active_profile_by_email_in_tenant(&current.email, target_tenant_id)
            .await
            .map_err(|e| match e {
                GatehouseError::NotFound { .. } => AuthError::NoTenantAccess.into(),
                other => other,
            })?;

        self.issue(&sibling, false)
    }

    /// Validate a session token: verify signature and expiry, then run
    /// the liveness fast path. A cached "inactive" denies without a
    /// storage round-trip; a cache failure degrades to a direct
    /// storage read.
    pub async fn validate(&self, raw_token: &str) -> GatehouseResult<SessionClaims> {
        let claims = token::decode_session_token(raw_token, &self.config)?;
        let principal_id = claims.principal_id()?;

        let key = liveness_key(principal_id);
        match self.cache.get(&key).await {
            Ok(Some(cached)) => {
                if cached == b"1" {
                    return Ok(claims);
                }
                return Err(AuthError::PrincipalInactive.into());
            }
            Ok(None) => {}
            Err(e) => {
                warn!(principal_id = %principal_id, error = %e, "liveness cache read failed; falling back to storage");
            }
        }

        let liveness = self.principals.liveness(principal_id).await?;
        let live = liveness.is_live();

        let value: &[u8] = if live { b"1" } else { b"0" };
        if let Err(e) = self
            .cache
            .set(
                &key,
                value,
                Duration::from_secs(self.config.liveness_ttl_secs),
            )
            .await
        {
            warn!(principal_id = %principal_id, error = %e, "liveness cache write failed");
        }

        if !live {
            return Err(AuthError::PrincipalInactive.into());
        }
        Ok(claims)
    }

    /// Force the next validation for this principal to re-query
    /// storage. Must be called whenever a principal is deactivated so
    /// revocation is observable sooner than the TTL.
    pub async fn invalidate(&self, principal_id: Uuid) -> GatehouseResult<()> {
        self.cache.delete(&liveness_key(principal_id)).await
    }
}
