use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use vidrec::services::cache::{CacheStore, InMemoryCacheStore, NoopCacheStore};
use vidrec::services::recommendation::{cache_key, STAT_CACHE_ERRORS};
use vidrec::services::store::{CatalogStore, InMemoryStore};
use vidrec::*;

fn state_with_cache(cache: Arc<dyn CacheStore>) -> AppState {
    AppState::with_backends(Config::default(), Arc::new(InMemoryStore::new()), cache)
}

async fn seeded_state() -> AppState {
    let state = AppState::in_memory();
    demo::seed(&state.ingest_service, demo::DEMO_USER).await.unwrap();
    state
}

fn assert_ranked(items: &[RecommendationItem]) {
    for pair in items.windows(2) {
        let ordered = pair[0].score > pair[1].score
            || (pair[0].score == pair[1].score && pair[0].video_id < pair[1].video_id);
        assert!(ordered, "out of order: {:?}", items);
    }
}

#[tokio::test]
async fn test_seed_scenario_returns_the_two_unseen_videos() {
    let state = seeded_state().await;
    let response = state
        .recommendation_service
        .recommend(demo::DEMO_USER, 4)
        .await
        .unwrap();

    assert_eq!(response.user_id, demo::DEMO_USER);
    assert_eq!(response.k, 4);

    let ids: HashSet<&str> = response.items.iter().map(|i| i.video_id.as_str()).collect();
    let expected: HashSet<&str> = ["VID_ML_004", "VID_ML_005"].into_iter().collect();
    assert_eq!(ids, expected);
    assert_eq!(response.items.len(), 2);

    for item in &response.items {
        assert_eq!(item.source, RecommendationSource::Personalized);
        assert!(item.score > 0.0 && item.score <= 1.0);
        assert_eq!(item.reasons[0], "Similar to your recent watch and like history");
    }
    assert_ranked(&response.items);
}

#[tokio::test]
async fn test_overlap_keywords_explain_the_match() {
    let state = seeded_state().await;
    let response = state
        .recommendation_service
        .recommend(demo::DEMO_USER, 4)
        .await
        .unwrap();

    let ids: Vec<&str> = response.items.iter().map(|i| i.video_id.as_str()).collect();
    assert_eq!(ids, vec!["VID_ML_004", "VID_ML_005"]);

    // "systems" is shared with the watched recommender-systems intro.
    let indexing = &response.items[1];
    assert_eq!(indexing.overlap_keywords, vec!["systems"]);
    assert_eq!(indexing.reasons[1], "Overlapping keywords: systems");

    // "patterns" only reaches the profile through the clicked caching video,
    // yet it is the sole shared term and still explains the top match.
    let fastapi = &response.items[0];
    assert_eq!(fastapi.overlap_keywords, vec!["patterns"]);
    assert_eq!(fastapi.reasons.len(), 2);
    assert_eq!(fastapi.reasons[1], "Overlapping keywords: patterns");
}

#[tokio::test]
async fn test_new_user_gets_cold_start_only() {
    let state = seeded_state().await;
    let response = state
        .recommendation_service
        .recommend("brand-new-user", 4)
        .await
        .unwrap();

    assert_eq!(response.items.len(), 4);
    assert!(response
        .items
        .iter()
        .all(|i| i.source == RecommendationSource::ColdStart));
    assert!(response
        .items
        .iter()
        .all(|i| i.reasons[0] == "No viewing history yet; showing catalog picks"));
    assert_ranked(&response.items);
}

#[tokio::test]
async fn test_shortfall_mixes_personalized_then_cold_start() {
    let state = AppState::in_memory();
    for (id, title) in [
        ("v1", "Redis cache patterns"),
        ("v2", "Redis cluster sizing"),
        ("v3", "Sourdough baking at home"),
        ("v4", "Knife skills for beginners"),
    ] {
        state
            .ingest_service
            .upsert_video(VideoUpsert {
                video_id: id.to_string(),
                channel_id: "c1".to_string(),
                title: title.to_string(),
                description: None,
                tags: Vec::new(),
                duration_seconds: None,
                published_at: None,
            })
            .await
            .unwrap();
    }
    state
        .ingest_service
        .record_interaction(InteractionCreate {
            user_id: "u1".to_string(),
            video_id: "v1".to_string(),
            event_type: EventType::Like,
            watch_seconds: None,
            timestamp: None,
            metadata: None,
        })
        .await
        .unwrap();

    let response = state.recommendation_service.recommend("u1", 3).await.unwrap();
    let sources: Vec<RecommendationSource> = response.items.iter().map(|i| i.source).collect();
    assert_eq!(
        sources,
        vec![
            RecommendationSource::Personalized,
            RecommendationSource::ColdStart,
            RecommendationSource::ColdStart
        ]
    );
    assert_eq!(response.items[0].video_id, "v2");

    let ids: HashSet<&str> = response.items.iter().map(|i| i.video_id.as_str()).collect();
    assert_eq!(ids.len(), 3);
    assert!(!ids.contains("v1"));
    assert_ranked(&response.items);
}

#[tokio::test]
async fn test_empty_catalog_returns_empty_list() {
    let state = AppState::in_memory();
    let response = state.recommendation_service.recommend("u1", 10).await.unwrap();
    assert!(response.items.is_empty());
}

#[tokio::test]
async fn test_single_empty_item_does_not_panic() {
    let state = AppState::in_memory();
    state
        .ingest_service
        .upsert_video(VideoUpsert {
            video_id: "blank".to_string(),
            channel_id: "c1".to_string(),
            title: String::new(),
            description: None,
            tags: Vec::new(),
            duration_seconds: None,
            published_at: None,
        })
        .await
        .unwrap();

    let response = state.recommendation_service.recommend("u1", 5).await.unwrap();
    assert_eq!(response.items.len(), 1);
    assert_eq!(response.items[0].source, RecommendationSource::ColdStart);
}

#[tokio::test]
async fn test_cache_hit_is_byte_identical() {
    let cache = Arc::new(InMemoryCacheStore::new());
    let state = state_with_cache(cache.clone());
    demo::seed(&state.ingest_service, demo::DEMO_USER).await.unwrap();

    let first = state
        .recommendation_service
        .recommend_payload(demo::DEMO_USER, 4)
        .await
        .unwrap();
    let stored = cache.get(&cache_key(demo::DEMO_USER, 4)).await.unwrap().unwrap();
    let second = state
        .recommendation_service
        .recommend_payload(demo::DEMO_USER, 4)
        .await
        .unwrap();

    assert_eq!(first, stored);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_invalidation_never_serves_stale_payload() {
    let state = seeded_state().await;
    let before = state
        .recommendation_service
        .recommend(demo::DEMO_USER, 4)
        .await
        .unwrap();
    assert!(before.items.iter().any(|i| i.video_id == "VID_ML_004"));

    state
        .ingest_service
        .record_interaction(InteractionCreate {
            user_id: demo::DEMO_USER.to_string(),
            video_id: "VID_ML_004".to_string(),
            event_type: EventType::Skip,
            watch_seconds: None,
            timestamp: None,
            metadata: None,
        })
        .await
        .unwrap();

    let after = state
        .recommendation_service
        .recommend(demo::DEMO_USER, 4)
        .await
        .unwrap();
    assert!(after.items.iter().all(|i| i.video_id != "VID_ML_004"));
    assert_eq!(after.items.len(), 1);
}

#[tokio::test]
async fn test_explicit_clear_reports_count() {
    let state = seeded_state().await;
    for k in [1, 2, 3] {
        state
            .recommendation_service
            .recommend(demo::DEMO_USER, k)
            .await
            .unwrap();
    }
    let cleared = state
        .recommendation_service
        .invalidate_user_cache(demo::DEMO_USER)
        .await
        .unwrap();
    assert_eq!(cleared, 3);
}

#[tokio::test]
async fn test_independent_computations_agree() {
    let a = seeded_state().await;
    let b = seeded_state().await;

    let left = a.recommendation_service.compute(demo::DEMO_USER, 4).await.unwrap();
    let right = b.recommendation_service.compute(demo::DEMO_USER, 4).await.unwrap();
    let left_ids: Vec<&str> = left.items.iter().map(|i| i.video_id.as_str()).collect();
    let right_ids: Vec<&str> = right.items.iter().map(|i| i.video_id.as_str()).collect();
    assert_eq!(left_ids, right_ids);
}

/// Cache whose every operation fails, like an unreachable Redis.
struct UnavailableCache;

#[async_trait]
impl CacheStore for UnavailableCache {
    async fn get(&self, _key: &str) -> RecResult<Option<Vec<u8>>> {
        Err(RecError::CacheUnavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl_seconds: u64) -> RecResult<()> {
        Err(RecError::CacheUnavailable("connection refused".to_string()))
    }

    async fn delete_matching(&self, _pattern: &str) -> RecResult<usize> {
        Err(RecError::CacheUnavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_unavailable_cache_never_fails_requests() {
    let state = state_with_cache(Arc::new(UnavailableCache));
    demo::seed(&state.ingest_service, demo::DEMO_USER).await.unwrap();

    let response = state
        .recommendation_service
        .recommend(demo::DEMO_USER, 4)
        .await
        .unwrap();
    assert_eq!(response.items.len(), 2);
    assert!(state.recommendation_service.stat(STAT_CACHE_ERRORS) > 0);

    assert!(state
        .recommendation_service
        .invalidate_user_cache(demo::DEMO_USER)
        .await
        .is_err());
}

#[tokio::test]
async fn test_concurrent_requests_build_one_index() {
    let state = state_with_cache(Arc::new(NoopCacheStore));
    demo::seed(&state.ingest_service, demo::DEMO_USER).await.unwrap();

    let requests = (0..16).map(|i| {
        let service = state.recommendation_service.clone();
        async move { service.recommend(&format!("user-{}", i), 3).await }
    });
    for result in futures::future::join_all(requests).await {
        assert_eq!(result.unwrap().items.len(), 3);
    }
    assert_eq!(state.recommendation_service.index_builds(), 1);
}

#[tokio::test]
async fn test_store_lists_seeded_catalog() {
    let state = seeded_state().await;
    let catalog = state.store.list_catalog().await.unwrap();
    assert_eq!(catalog.len(), 6);
    let events = state.store.list_interactions(demo::DEMO_USER).await.unwrap();
    assert_eq!(events.len(), 4);
}

#[test]
fn test_blocking_callers_can_drive_the_service() {
    let state = AppState::in_memory();
    let response = tokio_test::block_on(async {
        demo::seed(&state.ingest_service, "u1").await.unwrap();
        state.recommendation_service.recommend("u1", 4).await.unwrap()
    });
    assert_eq!(response.items.len(), 2);
}
