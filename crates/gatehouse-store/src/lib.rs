//! Gatehouse Store — concrete adapters behind the repository and cache
//! contracts.
//!
//! `MemStore` implements every repository trait over sharded in-memory
//! maps; it is the default backend and the one the test suites run
//! against. The cache side ships an in-memory implementation for
//! single-instance deployments and a Redis one for anything shared.

pub mod cache;
pub mod memory;

pub use cache::{InMemoryCache, RedisCache};
pub use memory::MemStore;
