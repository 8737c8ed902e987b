//! Cache contract.
//!
//! The liveness and active-visit caches are shared, mutable, TTL-based
//! state. Deployments must back this with a store shared across all
//! service instances — an instance-local map makes explicit
//! invalidation effective only on the instance that received the
//! mutation, which is a correctness bug, not a tuning concern.
//!
//! TTL is a safety net for entries nobody explicitly invalidated;
//! proactive deletion on every mutation is the primary consistency
//! mechanism.

use std::time::Duration;

use crate::error::GatehouseResult;

pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = GatehouseResult<Option<Vec<u8>>>> + Send;

    fn set(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> impl Future<Output = GatehouseResult<()>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = GatehouseResult<()>> + Send;
}
