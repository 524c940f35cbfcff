use crate::algorithms::ContentRecommender;
use crate::config::Config;
use crate::error::{RecError, RecResult};
use crate::models::*;
use crate::services::cache::CacheStore;
use crate::services::index::IndexManager;
use crate::services::store::CatalogStore;
use crate::utils::escape_glob;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const STAT_REQUESTS: &str = "requests";
pub const STAT_CACHE_HITS: &str = "cache_hits";
pub const STAT_CACHE_MISSES: &str = "cache_misses";
pub const STAT_CACHE_ERRORS: &str = "cache_errors";
pub const STAT_INDEX_BUILDS: &str = "index_builds";

pub fn cache_key(user_id: &str, k: usize) -> String {
    format!("recs:{}:{}", user_id, k)
}

pub fn user_cache_pattern(user_id: &str) -> String {
    format!("recs:{}:*", escape_glob(user_id))
}

pub const ALL_RECOMMENDATIONS_PATTERN: &str = "recs:*";

pub struct RecommendationService {
    store: Arc<dyn CatalogStore>,
    cache: Arc<dyn CacheStore>,
    indexes: IndexManager,
    recommender: ContentRecommender,
    config: Arc<Config>,
    serving_stats: DashMap<String, u64>,
    /// Bumped before each user eviction; a response computed under an older
    /// generation is never written back.
    user_generations: DashMap<String, u64>,
    global_generation: AtomicU64,
}

/// Invalidation state observed when a compute started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Generation {
    global: u64,
    user: u64,
}

impl RecommendationService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<dyn CacheStore>,
        config: Arc<Config>,
    ) -> Self {
        let indexes = IndexManager::new(config.recommendation.max_features);
        let recommender = ContentRecommender::new(&config.recommendation);

        Self {
            store,
            cache,
            indexes,
            recommender,
            config,
            serving_stats: DashMap::new(),
            user_generations: DashMap::new(),
            global_generation: AtomicU64::new(0),
        }
    }

    /// Serialized response for `(user_id, k)`, from cache when a valid entry
    /// exists. The returned bytes are exactly what the cache holds.
    pub async fn recommend_payload(&self, user_id: &str, k: usize) -> RecResult<Vec<u8>> {
        self.increment_stat(STAT_REQUESTS);
        let key = cache_key(user_id, k);

        match self.cache.get(&key).await {
            Ok(Some(bytes)) => {
                if serde_json::from_slice::<RecommendationResponse>(&bytes).is_ok() {
                    debug!("Cache hit for {}", key);
                    self.increment_stat(STAT_CACHE_HITS);
                    return Ok(bytes);
                }
                warn!("Discarding undecodable cache entry {}", key);
                self.increment_stat(STAT_CACHE_MISSES);
            }
            Ok(None) => {
                debug!("Cache miss for {}", key);
                self.increment_stat(STAT_CACHE_MISSES);
            }
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                self.increment_stat(STAT_CACHE_ERRORS);
            }
        }

        let started = self.generation(user_id);
        let response = self.compute(user_id, k).await?;
        let bytes = serde_json::to_vec(&response)?;

        if self.generation(user_id) != started {
            debug!("Invalidated while computing {}, not caching", key);
            return Ok(bytes);
        }

        let ttl = self.config.cache.recommendation_ttl_seconds;
        if let Err(e) = self.cache.set(&key, bytes.clone(), ttl).await {
            warn!("Cache write failed for {}: {}", key, e);
            self.increment_stat(STAT_CACHE_ERRORS);
            return Ok(bytes);
        }

        // An eviction may have run between the check and the write.
        if self.generation(user_id) != started {
            if let Err(e) = self.cache.delete_matching(&escape_glob(&key)).await {
                warn!("Failed to drop stale cache entry {}: {}", key, e);
                self.increment_stat(STAT_CACHE_ERRORS);
            }
        }

        Ok(bytes)
    }

    pub async fn recommend(&self, user_id: &str, k: usize) -> RecResult<RecommendationResponse> {
        let bytes = self.recommend_payload(user_id, k).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Runs the ranking pipeline against fresh store snapshots, bypassing the
    /// response cache.
    pub async fn compute(&self, user_id: &str, k: usize) -> RecResult<RecommendationResponse> {
        if k == 0 {
            return Ok(RecommendationResponse::empty(user_id, k));
        }

        let (items, interactions) = futures::try_join!(
            self.store.list_catalog(),
            self.store.list_interactions(user_id)
        )?;

        if items.is_empty() {
            debug!("Empty catalog, nothing to recommend for {}", user_id);
            return Ok(RecommendationResponse::empty(user_id, k));
        }

        let catalog = self.indexes.get_or_build(items).await?;
        let recommender = self.recommender.clone();
        let ranked = tokio::task::spawn_blocking(move || recommender.recommend(&catalog, &interactions, k))
            .await
            .map_err(|e| RecError::Internal(format!("Ranking task failed: {}", e)))?;

        info!(
            "Generated {} recommendations for user {} (k = {})",
            ranked.len(),
            user_id,
            k
        );

        Ok(RecommendationResponse {
            user_id: user_id.to_string(),
            k,
            items: ranked,
        })
    }

    /// Deletes every cached response for `user_id`.
    pub async fn invalidate_user_cache(&self, user_id: &str) -> RecResult<usize> {
        *self.user_generations.entry(user_id.to_string()).or_insert(0) += 1;
        let deleted = self.cache.delete_matching(&user_cache_pattern(user_id)).await?;
        info!("Cleared {} recommendation cache keys for {}", deleted, user_id);
        Ok(deleted)
    }

    pub async fn invalidate_all(&self) -> RecResult<usize> {
        self.global_generation.fetch_add(1, Ordering::SeqCst);
        self.cache.delete_matching(ALL_RECOMMENDATIONS_PATTERN).await
    }

    /// Invalidation on the write path: a cache failure is logged and
    /// counted, never surfaced to the writer.
    pub async fn evict_user(&self, user_id: &str) -> usize {
        match self.invalidate_user_cache(user_id).await {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!("Failed to clear recommendation cache for {}: {}", user_id, e);
                self.increment_stat(STAT_CACHE_ERRORS);
                0
            }
        }
    }

    pub async fn evict_all(&self) -> usize {
        match self.invalidate_all().await {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!("Failed to clear recommendation caches: {}", e);
                self.increment_stat(STAT_CACHE_ERRORS);
                0
            }
        }
    }

    pub fn index_builds(&self) -> u64 {
        self.indexes.builds()
    }

    pub fn get_serving_stats(&self) -> HashMap<String, u64> {
        let mut stats: HashMap<String, u64> = self
            .serving_stats
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        stats.insert(STAT_INDEX_BUILDS.to_string(), self.indexes.builds());
        stats
    }

    pub fn stat(&self, key: &str) -> u64 {
        if key == STAT_INDEX_BUILDS {
            return self.indexes.builds();
        }
        self.serving_stats.get(key).map(|v| *v).unwrap_or(0)
    }

    fn generation(&self, user_id: &str) -> Generation {
        Generation {
            global: self.global_generation.load(Ordering::SeqCst),
            user: self.user_generations.get(user_id).map(|g| *g).unwrap_or(0),
        }
    }

    fn increment_stat(&self, key: &str) {
        let mut counter = self.serving_stats.entry(key.to_string()).or_insert(0);
        *counter += 1;
    }
}
