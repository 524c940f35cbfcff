use super::{placeholder_channel_title, CatalogStore};
use crate::error::RecResult;
use crate::models::{CatalogItem, Channel, InteractionEvent};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Process-local store used by tests, the demo and the default config.
#[derive(Default)]
pub struct InMemoryStore {
    channels: RwLock<HashMap<String, Channel>>,
    videos: RwLock<HashMap<String, CatalogItem>>,
    interactions: RwLock<HashMap<String, Vec<InteractionEvent>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self, channel_id: &str) -> Option<Channel> {
        self.channels.read().get(channel_id).cloned()
    }

    fn sorted_videos(&self) -> Vec<CatalogItem> {
        let mut videos: Vec<CatalogItem> = self.videos.read().values().cloned().collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        videos
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_catalog(&self) -> RecResult<Vec<CatalogItem>> {
        Ok(self.sorted_videos())
    }

    async fn list_videos(&self, limit: usize) -> RecResult<Vec<CatalogItem>> {
        let mut videos = self.sorted_videos();
        videos.truncate(limit);
        Ok(videos)
    }

    async fn list_interactions(&self, user_id: &str) -> RecResult<Vec<InteractionEvent>> {
        let mut events = self
            .interactions
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_default();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(events)
    }

    async fn video_exists(&self, video_id: &str) -> RecResult<bool> {
        Ok(self.videos.read().contains_key(video_id))
    }

    async fn upsert_channel(&self, channel: Channel) -> RecResult<Channel> {
        let mut channels = self.channels.write();
        let stored = channels
            .entry(channel.channel_id.clone())
            .and_modify(|existing| existing.title = channel.title.clone())
            .or_insert(channel);
        Ok(stored.clone())
    }

    async fn upsert_video(&self, mut item: CatalogItem) -> RecResult<CatalogItem> {
        self.channels
            .write()
            .entry(item.channel_id.clone())
            .or_insert_with(|| {
                Channel::new(item.channel_id.clone(), placeholder_channel_title(&item.channel_id))
            });

        let mut videos = self.videos.write();
        if let Some(existing) = videos.get(&item.id) {
            item.created_at = existing.created_at;
        }
        videos.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    async fn insert_interactions(&self, events: &[InteractionEvent]) -> RecResult<usize> {
        let mut interactions = self.interactions.write();
        for event in events {
            interactions
                .entry(event.user_id.clone())
                .or_default()
                .push(event.clone());
        }
        Ok(events.len())
    }
}
