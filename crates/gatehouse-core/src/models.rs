//! Domain models for the gatehouse core.
//!
//! Every tenant-scoped entity carries a `tenant_id`; cross-tenant
//! leakage of any of them is a correctness violation.

pub mod permission;
pub mod principal;
pub mod role;
pub mod tenant;
pub mod visit;
pub mod visitor;
