//! Visit domain model.
//!
//! Status transitions are monotonic and one-directional:
//! `scheduled -> checked_in -> checked_out`, with direct check-in
//! starting at `checked_in`. A visit never reverts to an earlier state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::visitor::Visitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Scheduled,
    CheckedIn,
    CheckedOut,
}

impl VisitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::Scheduled => "scheduled",
            VisitStatus::CheckedIn => "checked_in",
            VisitStatus::CheckedOut => "checked_out",
        }
    }
}

impl std::fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bounded presence episode of a visitor at a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub visitor_id: Uuid,
    /// The hosting principal.
    pub host_id: Uuid,
    pub purpose: String,
    pub location: Option<String>,
    pub status: VisitStatus,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub check_in_at: Option<DateTime<Utc>>,
    pub check_out_at: Option<DateTime<Utc>>,
    /// Signed capability token (`vv:{visitId}:{mac}`), set once a pass
    /// has been generated for a scheduled visit.
    pub pass_token: Option<String>,
    /// Rendered scannable representation of the pass URL.
    pub pass_artifact: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateVisit {
    pub tenant_id: Uuid,
    pub visitor_id: Uuid,
    pub host_id: Uuid,
    pub purpose: String,
    pub location: Option<String>,
    pub status: VisitStatus,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub check_in_at: Option<DateTime<Utc>>,
}

/// Minimal host view embedded in visit listings — never includes
/// credentials or flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// A visit joined with its visitor and host, the shape returned by
/// every read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitDetails {
    pub visit: Visit,
    pub visitor: Visitor,
    pub host: HostSummary,
}

/// Filters for the visit history listing.
#[derive(Debug, Clone, Default)]
pub struct VisitFilter {
    pub status: Option<VisitStatus>,
    pub host_id: Option<Uuid>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    /// Case-insensitive match over visitor name and purpose.
    pub search: Option<String>,
}
