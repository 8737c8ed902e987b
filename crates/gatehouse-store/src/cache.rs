//! Cache adapters.
//!
//! `InMemoryCache` is for single-instance deployments and tests;
//! `RedisCache` is the shared backend for anything running more than
//! one instance, since explicit invalidation must reach every instance
//! to be meaningful.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use gatehouse_core::cache::Cache;
use gatehouse_core::{GatehouseError, GatehouseResult};

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Process-local TTL cache over a sharded map.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<DashMap<String, Entry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> GatehouseResult<Option<Vec<u8>>> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> GatehouseResult<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> GatehouseResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

fn cache_err(e: redis::RedisError) -> GatehouseError {
    GatehouseError::Cache(e.to_string())
}

/// Redis-backed cache over a multiplexed connection; the connection is
/// cheap to clone and safe to share across tasks.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    pub async fn connect(url: &str) -> GatehouseResult<Self> {
        let client = redis::Client::open(url).map_err(cache_err)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(cache_err)?;
        Ok(Self { conn })
    }
}

impl Cache for RedisCache {
    async fn get(&self, key: &str) -> GatehouseResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(cache_err)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> GatehouseResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex(key, value, ttl.as_secs().max(1))
            .await
            .map_err(cache_err)
    }

    async fn delete(&self, key: &str) -> GatehouseResult<()> {
        let mut conn = self.conn.clone();
        let _: u64 = conn.del(key).await.map_err(cache_err)?;
        Ok(())
    }
}
