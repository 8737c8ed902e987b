//! Gatehouse server entry point.
//!
//! Initializes logging, selects the cache backend, runs the idempotent
//! bootstrap (permission catalog, default role reconciliation), and
//! stays up until interrupted.

use std::env;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gatehouse_core::cache::Cache;
use gatehouse_rbac::RbacService;
use gatehouse_store::{InMemoryCache, MemStore, RedisCache};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("gatehouse=info".parse().unwrap()),
        )
        .json()
        .init();

    info!("starting gatehouse server");

    let store = MemStore::new();

    // A shared cache is required as soon as there is more than one
    // instance; the process-local fallback exists for development.
    match env::var("REDIS_URL") {
        Ok(url) => match RedisCache::connect(&url).await {
            Ok(cache) => {
                info!("connected to redis cache");
                run(store, cache).await;
            }
            Err(e) => {
                error!(error = %e, "failed to connect to redis");
                std::process::exit(1);
            }
        },
        Err(_) => {
            warn!("REDIS_URL not set; using process-local cache (single instance only)");
            run(store, InMemoryCache::new()).await;
        }
    }

    info!("gatehouse server stopped");
}

async fn run<C: Cache + Clone + 'static>(store: MemStore, cache: C) {
    let rbac = RbacService::new(store.clone(), store.clone(), store, cache);

    match rbac.ensure_catalog().await {
        Ok(created) => info!(created, "permission catalog ready"),
        Err(e) => warn!(error = %e, "catalog seeding failed; permissions may be incomplete"),
    }
    // Reconciliation is idempotent and per-tenant fault-isolated, so it
    // runs in the background and never blocks readiness.
    tokio::spawn(async move {
        if let Err(e) = rbac.reconcile_all_tenants().await {
            warn!(error = %e, "default role reconciliation failed");
        }
    });

    info!("gatehouse server ready");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
