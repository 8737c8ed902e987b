//! Visitor and visit repositories over the in-memory store.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use gatehouse_core::models::visit::{
    CreateVisit, Visit, VisitDetails, VisitFilter, VisitStatus,
};
use gatehouse_core::models::visitor::{CreateVisitor, Visitor};
use gatehouse_core::repository::{
    PaginatedResult, Pagination, VisitRepository, VisitorRepository,
};
use gatehouse_core::{GatehouseError, GatehouseResult};

use super::{MemStore, paginate};

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl VisitorRepository for MemStore {
    async fn create(&self, input: CreateVisitor) -> GatehouseResult<Visitor> {
        self.tenant(input.tenant_id)?;
        let visitor = Visitor {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            company: input.company,
            document_id: input.document_id,
            notes: input.notes,
            created_at: Utc::now(),
        };
        self.db.visitors.insert(visitor.id, visitor.clone());
        Ok(visitor)
    }

    async fn get(&self, tenant_id: Uuid, id: Uuid) -> GatehouseResult<Visitor> {
        self.db
            .visitors
            .get(&id)
            .filter(|v| v.tenant_id == tenant_id)
            .map(|v| v.clone())
            .ok_or_else(|| GatehouseError::not_found("visitor"))
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        search: Option<&str>,
        pagination: Pagination,
    ) -> GatehouseResult<PaginatedResult<Visitor>> {
        let needle = search.map(str::to_lowercase);
        let mut matches: Vec<Visitor> = self
            .db
            .visitors
            .iter()
            .filter(|v| v.tenant_id == tenant_id)
            .filter(|v| {
                let Some(needle) = needle.as_deref() else {
                    return true;
                };
                contains_ci(&v.full_name(), needle)
                    || v.email.as_deref().is_some_and(|s| contains_ci(s, needle))
                    || v.company.as_deref().is_some_and(|s| contains_ci(s, needle))
                    || v.document_id
                        .as_deref()
                        .is_some_and(|s| contains_ci(s, needle))
            })
            .map(|v| v.clone())
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(matches, pagination))
    }
}

impl MemStore {
    fn matching_visits(&self, tenant_id: Uuid, filter: &VisitFilter) -> Vec<Visit> {
        let needle = filter.search.as_deref().map(str::to_lowercase);
        self.db
            .visits
            .iter()
            .filter(|v| v.tenant_id == tenant_id)
            .filter(|v| filter.status.is_none_or(|s| v.status == s))
            .filter(|v| filter.host_id.is_none_or(|h| v.host_id == h))
            .filter(|v| filter.created_from.is_none_or(|t| v.created_at >= t))
            .filter(|v| filter.created_to.is_none_or(|t| v.created_at <= t))
            .map(|v| v.clone())
            .filter(|v| {
                let Some(needle) = needle.as_deref() else {
                    return true;
                };
                if contains_ci(&v.purpose, needle) {
                    return true;
                }
                self.db
                    .visitors
                    .get(&v.visitor_id)
                    .is_some_and(|visitor| contains_ci(&visitor.full_name(), needle))
            })
            .collect()
    }
}

impl VisitRepository for MemStore {
    async fn create(&self, input: CreateVisit) -> GatehouseResult<Visit> {
        let visit = Visit {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            visitor_id: input.visitor_id,
            host_id: input.host_id,
            purpose: input.purpose,
            location: input.location,
            status: input.status,
            scheduled_start: input.scheduled_start,
            scheduled_end: input.scheduled_end,
            check_in_at: input.check_in_at,
            check_out_at: None,
            pass_token: None,
            pass_artifact: None,
            created_at: Utc::now(),
        };
        self.db.visits.insert(visit.id, visit.clone());
        Ok(visit)
    }

    async fn get(&self, tenant_id: Uuid, id: Uuid) -> GatehouseResult<Visit> {
        self.db
            .visits
            .get(&id)
            .filter(|v| v.tenant_id == tenant_id)
            .map(|v| v.clone())
            .ok_or_else(|| GatehouseError::not_found("visit"))
    }

    async fn details(&self, tenant_id: Uuid, id: Uuid) -> GatehouseResult<VisitDetails> {
        let visit = VisitRepository::get(self, tenant_id, id).await?;
        self.visit_details(visit)
    }

    async fn get_for_pass(&self, id: Uuid) -> GatehouseResult<Visit> {
        self.db
            .visits
            .get(&id)
            .map(|v| v.clone())
            .ok_or_else(|| GatehouseError::not_found("visit"))
    }

    async fn transition(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        from: VisitStatus,
        to: VisitStatus,
        at: DateTime<Utc>,
    ) -> GatehouseResult<Visit> {
        // get_mut holds the shard lock for the whole check-and-update,
        // so two racing transitions serialize here and the loser sees
        // the winner's status.
        let mut visit = self
            .db
            .visits
            .get_mut(&id)
            .filter(|v| v.tenant_id == tenant_id)
            .ok_or_else(|| GatehouseError::not_found("visit"))?;
        if visit.status != from {
            return Err(GatehouseError::StateConflict {
                message: format!(
                    "visit is {}, expected {}",
                    visit.status.as_str(),
                    from.as_str()
                ),
            });
        }
        visit.status = to;
        match to {
            VisitStatus::CheckedIn => visit.check_in_at = Some(at),
            VisitStatus::CheckedOut => visit.check_out_at = Some(at),
            VisitStatus::Scheduled => {}
        }
        Ok(visit.clone())
    }

    async fn store_pass(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        token: &str,
        artifact: &str,
    ) -> GatehouseResult<Visit> {
        let mut visit = self
            .db
            .visits
            .get_mut(&id)
            .filter(|v| v.tenant_id == tenant_id)
            .ok_or_else(|| GatehouseError::not_found("visit"))?;
        visit.pass_token = Some(token.to_string());
        visit.pass_artifact = Some(artifact.to_string());
        Ok(visit.clone())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filter: VisitFilter,
        pagination: Pagination,
    ) -> GatehouseResult<PaginatedResult<VisitDetails>> {
        let mut visits = self.matching_visits(tenant_id, &filter);
        visits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let page = paginate(visits, pagination);
        let items = page
            .items
            .into_iter()
            .map(|v| self.visit_details(v))
            .collect::<GatehouseResult<Vec<_>>>()?;
        Ok(PaginatedResult {
            items,
            total: page.total,
            offset: page.offset,
            limit: page.limit,
        })
    }

    async fn list_active(&self, tenant_id: Uuid) -> GatehouseResult<Vec<VisitDetails>> {
        let mut active: Vec<Visit> = self
            .db
            .visits
            .iter()
            .filter(|v| v.tenant_id == tenant_id && v.status == VisitStatus::CheckedIn)
            .map(|v| v.clone())
            .collect();
        active.sort_by(|a, b| b.check_in_at.cmp(&a.check_in_at).then(a.id.cmp(&b.id)));
        active
            .into_iter()
            .map(|v| self.visit_details(v))
            .collect()
    }
}
