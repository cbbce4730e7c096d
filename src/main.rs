//! kvdemo - Redis-backed HTTP demo with a read-through lookup cache
//!
//! This is the composition root that wires together all the components.

use kvdemo::config::{load_config, Config, StoreBackend};
use kvdemo::domain::ports::{CacheStore, PostRepository, ProfileRepository, VoteRepository};
use kvdemo::infrastructure::{shutdown_signal, ShutdownController};
use kvdemo::{ApiServer, ApiState, DashMapStore, IpApiClient, RedisStore};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;

/// Interval between sweeps of expired in-memory cache entries.
const MEMORY_GC_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "starting kvdemo store={} listen={} upstream={}",
        cfg.store.as_str(),
        cfg.listen_addr,
        cfg.lookup_url
    );

    // ===== COMPOSITION ROOT =====

    // 1. Store adapters; lookup cache keys live apart from feed data
    let state = match cfg.store {
        StoreBackend::Redis => {
            if cfg.cache_redis_url == cfg.redis_url {
                tracing::warn!(
                    "lookup cache shares {} with feed data; cached addresses can shadow feed keys",
                    cfg.redis_url
                );
            }
            let data = Arc::new(RedisStore::connect(&cfg.redis_url).await?);
            let cache = Arc::new(RedisStore::connect(&cfg.cache_redis_url).await?);
            tracing::info!(
                "connected to redis at {} (cache {})",
                cfg.redis_url,
                cfg.cache_redis_url
            );
            if cfg.flush_on_start {
                data.flush_all().await?;
                cache.flush_all().await?;
                tracing::info!("flushed redis");
            }
            build_state(&cfg, cache, data)
        }
        StoreBackend::Memory => {
            let data = Arc::new(DashMapStore::new());
            let cache = Arc::new(DashMapStore::new());
            if cfg.cache_ttl().is_some() {
                cache.start_gc(MEMORY_GC_INTERVAL);
            }
            build_state(&cfg, cache, data)
        }
    };

    // 2. Shutdown wiring
    let shutdown = ShutdownController::new();
    let state = state.with_shutdown(shutdown.clone());
    tokio::spawn(shutdown_signal(shutdown));

    // 3. Inbound adapter
    let server = ApiServer::new(cfg.listen_addr.clone(), state);
    server.run().await
}

/// Wire the application services: `cache` backs the lookup cache and `data`
/// every feed repository.
fn build_state<C, D>(cfg: &Config, cache: Arc<C>, data: Arc<D>) -> ApiState
where
    C: CacheStore + 'static,
    D: PostRepository + VoteRepository + ProfileRepository + 'static,
{
    let client = Arc::new(IpApiClient::new(&cfg.lookup_url));
    ApiState::from_stores(cache, data, client, cfg.cache_ttl(), cfg.store.as_str())
}
