use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Free-form payload attached to an interaction. Carried through storage but
/// never read by the ranking pipeline.
pub type InteractionMetadata = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    pub channel_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub duration_seconds: Option<u32>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Watch,
    Click,
    Like,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub user_id: String,
    pub video_id: String,
    pub event_type: EventType,
    pub watch_seconds: Option<u32>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<InteractionMetadata>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Personalized,
    ColdStart,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub video_id: String,
    pub score: f32,
    pub reasons: Vec<String>,
    /// Distinct terms shared by the user profile and the video, strongest first.
    pub overlap_keywords: Vec<String>,
    pub source: RecommendationSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: String,
    pub k: usize,
    pub items: Vec<RecommendationItem>,
}

impl EventType {
    /// Whether the event says something positive about the user's taste.
    pub fn is_positive(&self) -> bool {
        matches!(self, EventType::Watch | EventType::Click | EventType::Like)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Watch => "watch",
            EventType::Click => "click",
            EventType::Like => "like",
            EventType::Skip => "skip",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watch" => Ok(EventType::Watch),
            "click" => Ok(EventType::Click),
            "like" => Ok(EventType::Like),
            "skip" => Ok(EventType::Skip),
            other => Err(format!("unknown event type: {}", other)),
        }
    }
}

impl Channel {
    pub fn new(channel_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            title: title.into(),
            created_at: Utc::now(),
        }
    }
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, channel_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            title: title.into(),
            description: String::new(),
            tags: Vec::new(),
            duration_seconds: None,
            published_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// Timestamp used for recency: publication date when known, otherwise
    /// the moment the video entered the catalog.
    pub fn recency_timestamp(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }
}

impl InteractionEvent {
    pub fn new(user_id: impl Into<String>, video_id: impl Into<String>, event_type: EventType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            video_id: video_id.into(),
            event_type,
            watch_seconds: None,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn watch(user_id: impl Into<String>, video_id: impl Into<String>, seconds: u32) -> Self {
        Self::new(user_id, video_id, EventType::Watch).with_watch_seconds(seconds)
    }

    pub fn with_watch_seconds(mut self, seconds: u32) -> Self {
        self.watch_seconds = Some(seconds);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_metadata(mut self, metadata: InteractionMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelUpsert {
    pub channel_id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoUpsert {
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub duration_seconds: Option<u32>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionCreate {
    pub user_id: String,
    pub video_id: String,
    pub event_type: EventType,
    pub watch_seconds: Option<u32>,
    /// Defaults to the time the event is received.
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<InteractionMetadata>,
}

/// Bulk import of already-normalized events for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionImport {
    pub user_id: String,
    pub events: Vec<ImportedEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedEvent {
    pub video_id: String,
    pub event_type: EventType,
    pub watch_seconds: Option<u32>,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<InteractionMetadata>,
}

impl From<ChannelUpsert> for Channel {
    fn from(payload: ChannelUpsert) -> Self {
        Channel::new(payload.channel_id, payload.title)
    }
}

impl From<VideoUpsert> for CatalogItem {
    fn from(payload: VideoUpsert) -> Self {
        CatalogItem {
            id: payload.video_id,
            channel_id: payload.channel_id,
            title: payload.title,
            description: payload.description.unwrap_or_default(),
            tags: payload.tags,
            duration_seconds: payload.duration_seconds,
            published_at: payload.published_at,
            created_at: Utc::now(),
        }
    }
}

impl From<InteractionCreate> for InteractionEvent {
    fn from(payload: InteractionCreate) -> Self {
        InteractionEvent {
            id: Uuid::new_v4(),
            user_id: payload.user_id,
            video_id: payload.video_id,
            event_type: payload.event_type,
            watch_seconds: payload.watch_seconds,
            timestamp: payload.timestamp.unwrap_or_else(Utc::now),
            metadata: payload.metadata,
        }
    }
}

impl ImportedEvent {
    pub fn into_event(self, user_id: &str) -> InteractionEvent {
        InteractionEvent {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            video_id: self.video_id,
            event_type: self.event_type,
            watch_seconds: self.watch_seconds,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            metadata: self.metadata,
        }
    }
}

impl RecommendationResponse {
    pub fn empty(user_id: impl Into<String>, k: usize) -> Self {
        Self {
            user_id: user_id.into(),
            k,
            items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_wire_names() {
        let json = serde_json::to_string(&EventType::Like).unwrap();
        assert_eq!(json, "\"like\"");
        let parsed: EventType = serde_json::from_str("\"skip\"").unwrap();
        assert_eq!(parsed, EventType::Skip);
        assert!(!EventType::Skip.is_positive());
        assert!(EventType::Watch.is_positive());
    }

    #[test]
    fn test_source_wire_names() {
        let json = serde_json::to_string(&RecommendationSource::ColdStart).unwrap();
        assert_eq!(json, "\"cold_start\"");
    }

    #[test]
    fn test_recency_prefers_published_at() {
        let created = Utc::now();
        let published = created - chrono::Duration::days(30);
        let item = CatalogItem::new("v1", "c1", "Title")
            .with_created_at(created)
            .with_published_at(published);
        assert_eq!(item.recency_timestamp(), published);
    }

    #[test]
    fn test_interaction_deserializes_without_id_or_metadata() {
        let raw = r#"{
            "user_id": "u1",
            "video_id": "v1",
            "event_type": "watch",
            "watch_seconds": 120,
            "timestamp": "2025-01-01T00:00:00Z"
        }"#;
        let event: InteractionEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.event_type, EventType::Watch);
        assert_eq!(event.watch_seconds, Some(120));
        assert!(event.metadata.is_none());
        assert!(!event.id.is_nil());
    }

    #[test]
    fn test_video_upsert_uses_video_id_on_the_wire() {
        let raw = r#"{
            "video_id": "VID_ML_005",
            "channel_id": "UC_ML_02",
            "title": "Postgres Indexing Deep Dive",
            "tags": ["postgres"],
            "duration_seconds": 900
        }"#;
        let payload: VideoUpsert = serde_json::from_str(raw).unwrap();
        let item = CatalogItem::from(payload);
        assert_eq!(item.id, "VID_ML_005");
        assert_eq!(item.description, "");
        assert_eq!(item.duration_seconds, Some(900));
        assert!(item.published_at.is_none());
    }

    #[test]
    fn test_imported_event_takes_user_from_import() {
        let raw = r#"{"video_id": "v1", "event_type": "like"}"#;
        let imported: ImportedEvent = serde_json::from_str(raw).unwrap();
        let event = imported.into_event("u9");
        assert_eq!(event.user_id, "u9");
        assert_eq!(event.event_type, EventType::Like);
    }
}
