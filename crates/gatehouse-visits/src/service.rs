//! Visit engine — owns the visit state machine and the active-visit
//! cache.
//!
//! Every mutating operation is permission-gated through the caller's
//! validated claims. The sole exception is the public scan path, where
//! a verified pass token is the credential.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use gatehouse_auth::authz;
use gatehouse_auth::token::SessionClaims;
use gatehouse_core::cache::Cache;
use gatehouse_core::models::visit::{
    CreateVisit, VisitDetails, VisitFilter, VisitStatus,
};
use gatehouse_core::models::visitor::{CreateVisitor, Visitor};
use gatehouse_core::repository::{
    PaginatedResult, Pagination, PrincipalRepository, VisitRepository, VisitorRepository,
};
use gatehouse_core::{GatehouseError, GatehouseResult};
use gatehouse_rbac::catalog::keys;

use crate::limiter::FixedWindowLimiter;
use crate::pass;
use crate::render::PassRenderer;

/// Active-visit list staleness bound; mutations invalidate explicitly.
const ACTIVE_VISITS_TTL: Duration = Duration::from_secs(30);

/// Public scan quota: per caller, per window.
const PUBLIC_SCAN_LIMIT: u32 = 10;
const PUBLIC_SCAN_WINDOW: Duration = Duration::from_secs(60);

fn active_key(tenant_id: Uuid) -> String {
    format!("visits:active:{tenant_id}")
}

/// Configuration for the visit engine.
#[derive(Debug, Clone)]
pub struct VisitConfig {
    /// Service-wide secret for pass token MACs, supplied at boot.
    /// Distinct from the session signing secret.
    pub pass_secret: String,
    /// Base URL embedded in rendered passes.
    pub base_app_url: String,
}

impl Default for VisitConfig {
    fn default() -> Self {
        Self {
            pass_secret: String::new(),
            base_app_url: "http://localhost:3000".into(),
        }
    }
}

/// Direct check-in request: the visit starts in `checked_in`.
#[derive(Debug, Clone)]
pub struct CheckInRequest {
    pub visitor_id: Uuid,
    pub host_id: Uuid,
    pub purpose: String,
    pub location: Option<String>,
}

/// Schedule request: the visit starts in `scheduled`.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub visitor_id: Uuid,
    pub host_id: Uuid,
    pub purpose: String,
    pub location: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    /// Generate and store a pass immediately (the default path).
    pub generate_pass: bool,
}

/// Minimal public scan response. Deliberately excludes host contact
/// details, internal identifiers, and anything tenant-administrative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicScanOutcome {
    pub visitor_name: String,
    pub company: Option<String>,
    pub purpose: String,
    pub check_in_at: DateTime<Utc>,
}

pub struct VisitService<V, N, P, C, R>
where
    V: VisitRepository,
    N: VisitorRepository,
    P: PrincipalRepository,
    C: Cache,
    R: PassRenderer,
{
    visits: V,
    visitors: N,
    principals: P,
    cache: C,
    renderer: R,
    limiter: FixedWindowLimiter,
    config: VisitConfig,
}

impl<V, N, P, C, R> VisitService<V, N, P, C, R>
where
    V: VisitRepository,
    N: VisitorRepository,
    P: PrincipalRepository,
    C: Cache,
    R: PassRenderer,
{
    pub fn new(
        visits: V,
        visitors: N,
        principals: P,
        cache: C,
        renderer: R,
        config: VisitConfig,
    ) -> Self {
        Self {
            visits,
            visitors,
            principals,
            cache,
            renderer,
            limiter: FixedWindowLimiter::new(PUBLIC_SCAN_LIMIT, PUBLIC_SCAN_WINDOW),
            config,
        }
    }

    /// Guard shared by both creation paths: visitor and host must exist
    /// in the caller's tenant.
    async fn check_parties(
        &self,
        tenant_id: Uuid,
        visitor_id: Uuid,
        host_id: Uuid,
    ) -> GatehouseResult<()> {
        self.visitors.get(tenant_id, visitor_id).await?;
        self.principals
            .get_in_tenant(tenant_id, host_id)
            .await
            .map_err(|e| match e {
                GatehouseError::NotFound { .. } => GatehouseError::not_found("host"),
                other => other,
            })?;
        Ok(())
    }

    async fn invalidate_active(&self, tenant_id: Uuid) {
        if let Err(e) = self.cache.delete(&active_key(tenant_id)).await {
            warn!(tenant_id = %tenant_id, error = %e, "failed to invalidate active-visit cache");
        }
    }

    /// Direct check-in: creates the visit already `checked_in`, no
    /// `scheduled` state visited.
    pub async fn check_in(
        &self,
        claims: &SessionClaims,
        request: CheckInRequest,
    ) -> GatehouseResult<VisitDetails> {
        authz::require_permissions(claims, &[keys::VISIT_CHECKIN])?;
        let tenant_id = claims.tenant_uuid()?;
        self.check_parties(tenant_id, request.visitor_id, request.host_id)
            .await?;

        let now = Utc::now();
        let visit = self
            .visits
            .create(CreateVisit {
                tenant_id,
                visitor_id: request.visitor_id,
                host_id: request.host_id,
                purpose: request.purpose,
                location: request.location,
                status: VisitStatus::CheckedIn,
                scheduled_start: None,
                scheduled_end: None,
                check_in_at: Some(now),
            })
            .await?;

        self.invalidate_active(tenant_id).await;
        self.visits.details(tenant_id, visit.id).await
    }

    /// Schedule a future visit; by default also generates and stores
    /// its pass.
    pub async fn schedule(
        &self,
        claims: &SessionClaims,
        request: ScheduleRequest,
    ) -> GatehouseResult<VisitDetails> {
        authz::require_permissions(claims, &[keys::VISIT_CHECKIN])?;
        let tenant_id = claims.tenant_uuid()?;
        self.check_parties(tenant_id, request.visitor_id, request.host_id)
            .await?;

        let visit = self
            .visits
            .create(CreateVisit {
                tenant_id,
                visitor_id: request.visitor_id,
                host_id: request.host_id,
                purpose: request.purpose,
                location: request.location,
                status: VisitStatus::Scheduled,
                scheduled_start: request.scheduled_start,
                scheduled_end: request.scheduled_end,
                check_in_at: None,
            })
            .await?;

        if request.generate_pass {
            return self.generate_pass_for(tenant_id, visit.id).await;
        }
        self.visits.details(tenant_id, visit.id).await
    }

    /// Generate a pass for a scheduled visit.
    pub async fn generate_pass(
        &self,
        claims: &SessionClaims,
        visit_id: Uuid,
    ) -> GatehouseResult<VisitDetails> {
        authz::require_permissions(claims, &[keys::VISIT_CHECKIN])?;
        let tenant_id = claims.tenant_uuid()?;
        self.generate_pass_for(tenant_id, visit_id).await
    }

    async fn generate_pass_for(
        &self,
        tenant_id: Uuid,
        visit_id: Uuid,
    ) -> GatehouseResult<VisitDetails> {
        let visit = self.visits.get(tenant_id, visit_id).await?;
        if visit.status != VisitStatus::Scheduled {
            return Err(GatehouseError::StateConflict {
                message: "passes can only be generated for scheduled visits".into(),
            });
        }

        let token = pass::generate_pass_token(visit_id, &self.config.pass_secret)?;
        let url = pass::scan_url(&self.config.base_app_url, &token);
        let artifact = self.renderer.render(&url)?;

        self.visits
            .store_pass(tenant_id, visit_id, &token, &artifact)
            .await?;
        self.visits.details(tenant_id, visit_id).await
    }

    /// Authenticated pass scan: verifies the token, then applies the
    /// `scheduled -> checked_in` transition.
    pub async fn scan(
        &self,
        claims: &SessionClaims,
        token: &str,
    ) -> GatehouseResult<VisitDetails> {
        authz::require_permissions(claims, &[keys::VISIT_CHECKIN])?;
        let tenant_id = claims.tenant_uuid()?;
        let visit_id = pass::verify_pass_token(token, &self.config.pass_secret)?;

        let visit = self.visits.get(tenant_id, visit_id).await?;
        self.check_in_scheduled(tenant_id, visit_id, visit.status).await?;

        self.invalidate_active(tenant_id).await;
        self.visits.details(tenant_id, visit_id).await
    }

    /// Shared `scheduled -> checked_in` step. The repository-level
    /// compare-and-swap means a concurrent scan that lost the race
    /// surfaces as the same conflict as an already-advanced status.
    async fn check_in_scheduled(
        &self,
        tenant_id: Uuid,
        visit_id: Uuid,
        observed: VisitStatus,
    ) -> GatehouseResult<()> {
        match observed {
            VisitStatus::CheckedIn => {
                return Err(GatehouseError::StateConflict {
                    message: "visitor is already checked in".into(),
                });
            }
            VisitStatus::CheckedOut => {
                return Err(GatehouseError::StateConflict {
                    message: "visit has already been completed".into(),
                });
            }
            VisitStatus::Scheduled => {}
        }
        self.visits
            .transition(
                tenant_id,
                visit_id,
                VisitStatus::Scheduled,
                VisitStatus::CheckedIn,
                Utc::now(),
            )
            .await?;
        Ok(())
    }

    /// Public pass scan — no session at all; possession of the signed
    /// token is the credential, and a fixed per-caller quota is the
    /// only other abuse control.
    pub async fn public_scan(
        &self,
        caller: &str,
        token: &str,
    ) -> GatehouseResult<PublicScanOutcome> {
        if !self.limiter.allow(caller) {
            return Err(GatehouseError::RateLimited);
        }
        let visit_id = pass::verify_pass_token(token, &self.config.pass_secret)?;

        let visit = self.visits.get_for_pass(visit_id).await?;
        self.check_in_scheduled(visit.tenant_id, visit_id, visit.status)
            .await?;

        let visitor = self.visitors.get(visit.tenant_id, visit.visitor_id).await?;
        self.invalidate_active(visit.tenant_id).await;

        let checked_in = self.visits.get_for_pass(visit_id).await?;
        Ok(PublicScanOutcome {
            visitor_name: visitor.full_name(),
            company: visitor.company,
            purpose: checked_in.purpose,
            check_in_at: checked_in.check_in_at.unwrap_or_else(Utc::now),
        })
    }

    /// Check a visitor out. Conditional on the status observed here, so
    /// a concurrent checkout surfaces as a conflict, not a lost update.
    pub async fn checkout(
        &self,
        claims: &SessionClaims,
        visit_id: Uuid,
    ) -> GatehouseResult<VisitDetails> {
        authz::require_permissions(claims, &[keys::VISIT_CHECKOUT])?;
        let tenant_id = claims.tenant_uuid()?;

        let visit = self.visits.get(tenant_id, visit_id).await?;
        if visit.status == VisitStatus::CheckedOut {
            return Err(GatehouseError::StateConflict {
                message: "visit already checked out".into(),
            });
        }
        self.visits
            .transition(
                tenant_id,
                visit_id,
                visit.status,
                VisitStatus::CheckedOut,
                Utc::now(),
            )
            .await?;

        self.invalidate_active(tenant_id).await;
        self.visits.details(tenant_id, visit_id).await
    }

    /// Everyone currently on site, cache-first.
    pub async fn active_visits(
        &self,
        claims: &SessionClaims,
    ) -> GatehouseResult<Vec<VisitDetails>> {
        authz::require_permissions(claims, &[keys::VISIT_VIEW])?;
        let tenant_id = claims.tenant_uuid()?;
        let key = active_key(tenant_id);

        match self.cache.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(visits) => return Ok(visits),
                Err(e) => {
                    warn!(tenant_id = %tenant_id, error = %e, "discarding undecodable active-visit cache entry");
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(tenant_id = %tenant_id, error = %e, "active-visit cache read failed; falling back to storage");
            }
        }

        let visits = self.visits.list_active(tenant_id).await?;

        let encoded = serde_json::to_vec(&visits)
            .map_err(|e| GatehouseError::Internal(format!("active-visit cache encode: {e}")))?;
        if let Err(e) = self.cache.set(&key, &encoded, ACTIVE_VISITS_TTL).await {
            warn!(tenant_id = %tenant_id, error = %e, "active-visit cache write failed");
        }
        Ok(visits)
    }

    /// Visit history, newest first.
    pub async fn list(
        &self,
        claims: &SessionClaims,
        filter: VisitFilter,
        pagination: Pagination,
    ) -> GatehouseResult<PaginatedResult<VisitDetails>> {
        authz::require_permissions(claims, &[keys::VISIT_VIEW])?;
        let tenant_id = claims.tenant_uuid()?;
        self.visits.list(tenant_id, filter, pagination).await
    }
}

/// Visitor registry operations. Visitors exist independently of any
/// visit.
pub struct VisitorService<N: VisitorRepository> {
    visitors: N,
}

impl<N: VisitorRepository> VisitorService<N> {
    pub fn new(visitors: N) -> Self {
        Self { visitors }
    }

    pub async fn create(
        &self,
        claims: &SessionClaims,
        first_name: String,
        last_name: String,
        email: Option<String>,
        phone: Option<String>,
        company: Option<String>,
        document_id: Option<String>,
        notes: Option<String>,
    ) -> GatehouseResult<Visitor> {
        authz::require_permissions(claims, &[keys::VISITOR_MANAGE])?;
        let tenant_id = claims.tenant_uuid()?;
        self.visitors
            .create(CreateVisitor {
                tenant_id,
                first_name,
                last_name,
                email,
                phone,
                company,
                document_id,
                notes,
            })
            .await
    }

    pub async fn get(&self, claims: &SessionClaims, id: Uuid) -> GatehouseResult<Visitor> {
        authz::require_permissions(claims, &[keys::VISITOR_VIEW])?;
        let tenant_id = claims.tenant_uuid()?;
        self.visitors.get(tenant_id, id).await
    }

    pub async fn list(
        &self,
        claims: &SessionClaims,
        search: Option<&str>,
        pagination: Pagination,
    ) -> GatehouseResult<PaginatedResult<Visitor>> {
        authz::require_permissions(claims, &[keys::VISITOR_VIEW])?;
        let tenant_id = claims.tenant_uuid()?;
        self.visitors.list(tenant_id, search, pagination).await
    }
}
