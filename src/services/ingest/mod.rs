use crate::error::{RecError, RecResult};
use crate::models::*;
use crate::services::cache::CacheStore;
use crate::services::recommendation::RecommendationService;
use crate::services::store::CatalogStore;
use crate::utils::validation::{
    validate_catalog_item, validate_channel, validate_interaction, validate_user_id,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const VIDEO_LIST_PATTERN: &str = "api:videos:*";

pub fn video_list_key(limit: usize) -> String {
    format!("api:videos:{}", limit)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub user_id: String,
    pub received: usize,
    pub inserted: usize,
    pub skipped_unknown_video: usize,
    pub cache_keys_cleared: usize,
}

/// Write path for catalog entities and interactions. Every write honors the
/// cache contract: interaction writes clear that user's responses, catalog
/// writes clear all of them. Video upserts and imports also drop the cached
/// video listings.
pub struct IngestService {
    store: Arc<dyn CatalogStore>,
    cache: Arc<dyn CacheStore>,
    recommendations: Arc<RecommendationService>,
    video_list_ttl: u64,
}

impl IngestService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<dyn CacheStore>,
        recommendations: Arc<RecommendationService>,
        video_list_ttl: u64,
    ) -> Self {
        Self {
            store,
            cache,
            recommendations,
            video_list_ttl,
        }
    }

    pub async fn record_interaction(&self, payload: InteractionCreate) -> RecResult<InteractionEvent> {
        let event = InteractionEvent::from(payload);
        validate_interaction(&event)?;

        if !self.store.video_exists(&event.video_id).await? {
            return Err(RecError::NotFound(format!(
                "video_id {} does not exist",
                event.video_id
            )));
        }

        self.store
            .insert_interactions(std::slice::from_ref(&event))
            .await?;
        self.recommendations.evict_user(&event.user_id).await;

        info!(
            "Recorded {} on {} for user {}",
            event.event_type, event.video_id, event.user_id
        );
        Ok(event)
    }

    /// Stores a batch of normalized events for one user. Events pointing at
    /// unknown videos are skipped and counted rather than failing the batch.
    pub async fn import_interactions(&self, import: InteractionImport) -> RecResult<ImportSummary> {
        validate_user_id(&import.user_id)?;

        let received = import.events.len();
        let events: Vec<InteractionEvent> = import
            .events
            .into_iter()
            .map(|event| event.into_event(&import.user_id))
            .collect();
        for event in &events {
            validate_interaction(event)?;
        }

        let mut known: HashMap<String, bool> = HashMap::new();
        for event in &events {
            if !known.contains_key(&event.video_id) {
                let exists = self.store.video_exists(&event.video_id).await?;
                known.insert(event.video_id.clone(), exists);
            }
        }

        let accepted: Vec<InteractionEvent> = events
            .into_iter()
            .filter(|event| known.get(&event.video_id).copied().unwrap_or(false))
            .collect();

        let inserted = if accepted.is_empty() {
            0
        } else {
            self.store.insert_interactions(&accepted).await?
        };
        let cache_keys_cleared = self.recommendations.evict_user(&import.user_id).await;
        self.evict_video_lists().await;

        let summary = ImportSummary {
            user_id: import.user_id,
            received,
            inserted,
            skipped_unknown_video: received - accepted.len(),
            cache_keys_cleared,
        };
        info!(
            "Imported {} of {} events for user {}",
            summary.inserted, summary.received, summary.user_id
        );
        Ok(summary)
    }

    pub async fn upsert_video(&self, payload: VideoUpsert) -> RecResult<CatalogItem> {
        let item = CatalogItem::from(payload);
        validate_catalog_item(&item)?;

        let stored = self.store.upsert_video(item).await?;
        let cleared = self.recommendations.evict_all().await;
        self.evict_video_lists().await;

        info!("Upserted video {} ({} cache keys cleared)", stored.id, cleared);
        Ok(stored)
    }

    pub async fn upsert_channel(&self, payload: ChannelUpsert) -> RecResult<Channel> {
        let channel = Channel::from(payload);
        validate_channel(&channel)?;

        let stored = self.store.upsert_channel(channel).await?;
        info!("Upserted channel {}", stored.channel_id);
        Ok(stored)
    }

    /// Newest videos first, served from the listing cache when possible.
    /// Cache failures degrade to a store read.
    pub async fn list_videos(&self, limit: usize) -> RecResult<Vec<CatalogItem>> {
        let key = video_list_key(limit);
        match self.cache.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(videos) => return Ok(videos),
                Err(e) => warn!("Discarding undecodable cache entry {}: {}", key, e),
            },
            Ok(None) => debug!("Cache miss for {}", key),
            Err(e) => warn!("Cache read failed for {}: {}", key, e),
        }

        let videos = self.store.list_videos(limit).await?;
        let bytes = serde_json::to_vec(&videos)?;
        if let Err(e) = self.cache.set(&key, bytes, self.video_list_ttl).await {
            warn!("Cache write failed for {}: {}", key, e);
        }
        Ok(videos)
    }

    async fn evict_video_lists(&self) {
        if let Err(e) = self.cache.delete_matching(VIDEO_LIST_PATTERN).await {
            warn!("Failed to clear video list caches: {}", e);
        }
    }
}
