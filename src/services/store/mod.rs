pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use crate::error::RecResult;
use crate::models::{CatalogItem, Channel, InteractionEvent};
use async_trait::async_trait;

/// Persistence for catalog entities and interaction logs. The ranking
/// pipeline only ever reads snapshots through `list_catalog` and
/// `list_interactions`.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every video, newest first.
    async fn list_catalog(&self) -> RecResult<Vec<CatalogItem>>;

    /// At most `limit` videos, newest first.
    async fn list_videos(&self, limit: usize) -> RecResult<Vec<CatalogItem>>;

    /// All events recorded for `user_id`, newest first.
    async fn list_interactions(&self, user_id: &str) -> RecResult<Vec<InteractionEvent>>;

    async fn video_exists(&self, video_id: &str) -> RecResult<bool>;

    async fn upsert_channel(&self, channel: Channel) -> RecResult<Channel>;

    /// Inserts or replaces a video, keeping the original `created_at` on
    /// update. Creates a placeholder channel when `channel_id` is unknown.
    async fn upsert_video(&self, item: CatalogItem) -> RecResult<CatalogItem>;

    async fn insert_interactions(&self, events: &[InteractionEvent]) -> RecResult<usize>;
}

pub(crate) fn placeholder_channel_title(channel_id: &str) -> String {
    format!("Channel {}", channel_id)
}
