//! Six-video demo catalog shared by the seed binary, the usage demo, tests
//! and benchmarks.

use crate::error::RecResult;
use crate::models::*;
use crate::services::ingest::IngestService;

pub const DEMO_USER: &str = "AbhiKanani07";

pub fn channels() -> Vec<ChannelUpsert> {
    vec![
        ChannelUpsert {
            channel_id: "UC_ML_01".to_string(),
            title: "ML Core".to_string(),
        },
        ChannelUpsert {
            channel_id: "UC_ML_02".to_string(),
            title: "Data Infra".to_string(),
        },
    ]
}

fn video(
    video_id: &str,
    channel_id: &str,
    title: &str,
    description: &str,
    tags: &[&str],
    duration_seconds: u32,
) -> VideoUpsert {
    VideoUpsert {
        video_id: video_id.to_string(),
        channel_id: channel_id.to_string(),
        title: title.to_string(),
        description: Some(description.to_string()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        duration_seconds: Some(duration_seconds),
        published_at: None,
    }
}

pub fn videos() -> Vec<VideoUpsert> {
    vec![
        video(
            "VID_ML_001",
            "UC_ML_01",
            "Intro to Recommender Systems",
            "Overview of collaborative and content based methods.",
            &["recommender", "ml", "intro"],
            600,
        ),
        video(
            "VID_ML_002",
            "UC_ML_01",
            "TF-IDF for Content Ranking",
            "Using tfidf vectors for ranking videos.",
            &["tfidf", "nlp", "ranking"],
            720,
        ),
        video(
            "VID_ML_003",
            "UC_ML_01",
            "Cosine Similarity Explained",
            "Vector similarity for recommendation and retrieval.",
            &["cosine", "vectors", "ml"],
            540,
        ),
        video(
            "VID_ML_004",
            "UC_ML_01",
            "FastAPI Production Patterns",
            "Production backend patterns and deployment strategy.",
            &["fastapi", "backend", "deploy"],
            800,
        ),
        video(
            "VID_ML_005",
            "UC_ML_02",
            "Postgres Indexing Deep Dive",
            "Database indexing strategies for low-latency systems.",
            &["postgres", "database", "indexing"],
            900,
        ),
        video(
            "VID_ML_006",
            "UC_ML_02",
            "Redis Caching for APIs",
            "Cache patterns and invalidation techniques.",
            &["redis", "cache", "api"],
            670,
        ),
    ]
}

pub fn interactions(user_id: &str) -> Vec<InteractionCreate> {
    let event = |video_id: &str, event_type: EventType, watch_seconds: Option<u32>| {
        InteractionCreate {
            user_id: user_id.to_string(),
            video_id: video_id.to_string(),
            event_type,
            watch_seconds,
            timestamp: None,
            metadata: None,
        }
    };

    vec![
        event("VID_ML_001", EventType::Watch, Some(420)),
        event("VID_ML_002", EventType::Watch, Some(510)),
        event("VID_ML_003", EventType::Like, None),
        event("VID_ML_006", EventType::Click, None),
    ]
}

/// Loads the demo channels, videos and `user_id`'s interactions through the
/// regular write path.
pub async fn seed(ingest: &IngestService, user_id: &str) -> RecResult<()> {
    for channel in channels() {
        ingest.upsert_channel(channel).await?;
    }
    for video in videos() {
        ingest.upsert_video(video).await?;
    }
    for interaction in interactions(user_id) {
        ingest.record_interaction(interaction).await?;
    }
    Ok(())
}
