//! Gatehouse Core — domain models, error taxonomy, and the repository
//! and cache contracts every other crate builds on.

pub mod cache;
pub mod error;
pub mod models;
pub mod repository;

pub use error::{GatehouseError, GatehouseResult};
