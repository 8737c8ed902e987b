//! Permission domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable catalog entry. Global — not tenant-scoped. Created once
/// at bootstrap by the idempotent catalog seeder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    /// Dotted capability key (`resource.verb`, e.g. `visit.checkin`).
    pub key: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    pub key: String,
    pub description: String,
}
