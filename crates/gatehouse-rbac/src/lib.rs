//! Gatehouse RBAC — the permission catalog, declaratively defined
//! default roles, and the idempotent per-tenant reconciliation that
//! keeps them in sync.

pub mod catalog;
pub mod service;

pub use catalog::{DEFAULT_ROLES, DefaultRole, PERMISSION_KEYS};
pub use service::RbacService;
