pub mod algorithms;
pub mod config;
pub mod demo;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::config::Config;
pub use error::{RecError, RecResult};
pub use models::*;

use anyhow::Result;
use crate::config::{CacheBackend, StorageBackend};
use crate::services::cache::{CacheStore, InMemoryCacheStore, NoopCacheStore, RedisCacheStore};
use crate::services::ingest::IngestService;
use crate::services::recommendation::RecommendationService;
use crate::services::store::{CatalogStore, InMemoryStore, PgStore};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn CatalogStore>,
    pub cache: Arc<dyn CacheStore>,
    pub recommendation_service: Arc<RecommendationService>,
    pub ingest_service: Arc<IngestService>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn CatalogStore> = match config.storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory catalog store");
                Arc::new(InMemoryStore::new())
            }
            StorageBackend::Postgres => {
                let store = PgStore::connect(&config.postgres).await?;
                store.migrate().await?;
                info!("Connected to Postgres catalog store");
                Arc::new(store)
            }
        };

        let cache: Arc<dyn CacheStore> = match config.cache.backend {
            CacheBackend::Memory => Arc::new(InMemoryCacheStore::new()),
            CacheBackend::Redis => {
                let redis = RedisCacheStore::new(&config.redis.url)?;
                // Requests still succeed without Redis; only caching degrades.
                if let Err(e) = redis.ping().await {
                    warn!("Redis connection failed: {}", e);
                } else {
                    info!("Redis connection established");
                }
                Arc::new(redis)
            }
            CacheBackend::Disabled => Arc::new(NoopCacheStore),
        };

        Ok(Self::with_backends(config, store, cache))
    }

    /// Wires the services over already-constructed backends.
    pub fn with_backends(
        config: Config,
        store: Arc<dyn CatalogStore>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        let config = Arc::new(config);

        let recommendation_service = Arc::new(RecommendationService::new(
            store.clone(),
            cache.clone(),
            config.clone(),
        ));

        let ingest_service = Arc::new(IngestService::new(
            store.clone(),
            cache.clone(),
            recommendation_service.clone(),
            config.cache.video_list_ttl_seconds,
        ));

        Self {
            config,
            store,
            cache,
            recommendation_service,
            ingest_service,
        }
    }

    /// In-memory store and cache with default configuration.
    pub fn in_memory() -> Self {
        Self::with_backends(
            Config::default(),
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryCacheStore::new()),
        )
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
