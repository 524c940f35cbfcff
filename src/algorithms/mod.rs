pub mod cold_start;
pub mod corpus;
pub mod explain;
pub mod profile;
pub mod scorer;
pub mod sparse;
pub mod vectorizer;

pub use cold_start::{ColdStartCandidate, ColdStartRanker, ColdStartSignal, ColdStartTrigger};
pub use explain::{Explanation, ExplanationGenerator};
pub use profile::{ProfileBuilder, UserProfile};
pub use scorer::ScoredCandidate;
pub use sparse::SparseVector;
pub use vectorizer::{CatalogFingerprint, VectorSpaceIndex};

use crate::config::RecommendationConfig;
use crate::error::RecResult;
use crate::models::{CatalogItem, InteractionEvent, RecommendationItem, RecommendationSource};
use std::collections::HashSet;

/// A catalog snapshot together with the index fitted over it. Rows of the
/// index line up with `items`.
#[derive(Debug, Clone)]
pub struct IndexedCatalog {
    pub items: Vec<CatalogItem>,
    pub index: VectorSpaceIndex,
}

impl IndexedCatalog {
    pub fn build(items: Vec<CatalogItem>, max_features: usize) -> RecResult<Self> {
        let index = VectorSpaceIndex::fit(&items, max_features)?;
        Ok(Self { items, index })
    }

    pub fn fingerprint(&self) -> CatalogFingerprint {
        self.index.fingerprint()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, video_id: &str) -> Option<&CatalogItem> {
        self.index.row_of(video_id).map(|row| &self.items[row])
    }
}

/// Content-based ranking pipeline: profile, similarity, cold-start fill and
/// explanations over one indexed snapshot.
#[derive(Debug, Clone)]
pub struct ContentRecommender {
    profiles: ProfileBuilder,
    cold_start: ColdStartRanker,
    explanations: ExplanationGenerator,
}

impl ContentRecommender {
    pub fn new(config: &RecommendationConfig) -> Self {
        Self {
            profiles: ProfileBuilder::new(config.weights.clone()),
            cold_start: ColdStartRanker::new(&config.cold_start),
            explanations: ExplanationGenerator::new(config.explanation.clone()),
        }
    }

    pub fn recommend(
        &self,
        catalog: &IndexedCatalog,
        interactions: &[InteractionEvent],
        k: usize,
    ) -> Vec<RecommendationItem> {
        if k == 0 || catalog.is_empty() {
            return Vec::new();
        }

        let mut exclude: HashSet<String> = interactions
            .iter()
            .map(|event| event.video_id.clone())
            .collect();

        let profile = self.profiles.build(interactions, catalog);
        let personalized = match &profile {
            UserProfile::Present(vector) => scorer::rank(vector, &catalog.index, &exclude, k),
            UserProfile::Absent => Vec::new(),
        };

        let mut items: Vec<RecommendationItem> = Vec::with_capacity(k.min(catalog.len()));
        if let Some(vector) = profile.vector() {
            for candidate in &personalized {
                let explanation = self.explanations.personalized(vector, candidate.row, &catalog.index);
                exclude.insert(candidate.video_id.clone());
                items.push(RecommendationItem {
                    video_id: candidate.video_id.clone(),
                    score: candidate.score,
                    reasons: explanation.reasons,
                    overlap_keywords: explanation.overlap_keywords,
                    source: RecommendationSource::Personalized,
                });
            }
        }

        if items.len() < k {
            let trigger = if profile.is_present() {
                ColdStartTrigger::Shortfall
            } else {
                ColdStartTrigger::NoProfile
            };
            // Cold picks sit strictly below the weakest personalized match.
            let scale = personalized
                .last()
                .map_or(1.0, |weakest| 0.5 * weakest.score);

            for candidate in self.cold_start.rank(catalog, &exclude, k - items.len()) {
                let explanation = self.explanations.cold_start(trigger, candidate.signal);
                items.push(RecommendationItem {
                    video_id: candidate.video_id,
                    score: candidate.score * scale,
                    reasons: explanation.reasons,
                    overlap_keywords: explanation.overlap_keywords,
                    source: RecommendationSource::ColdStart,
                });
            }
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventType;
    use chrono::{TimeZone, Utc};

    fn demo_catalog() -> IndexedCatalog {
        let day = |d: u32| Utc.with_ymd_and_hms(2025, 1, d, 0, 0, 0).unwrap();
        let items = vec![
            CatalogItem::new("v1", "c1", "Redis cache patterns")
                .with_description("Cache invalidation in practice")
                .with_duration(600)
                .with_created_at(day(1)),
            CatalogItem::new("v2", "c1", "Redis cluster operations")
                .with_description("Scaling a cache tier")
                .with_duration(600)
                .with_created_at(day(2)),
            CatalogItem::new("v3", "c2", "Sourdough baking")
                .with_description("Bread at home")
                .with_created_at(day(3)),
            CatalogItem::new("v4", "c2", "Pasta from scratch")
                .with_created_at(day(4)),
        ];
        IndexedCatalog::build(items, 25_000).unwrap()
    }

    fn recommender() -> ContentRecommender {
        ContentRecommender::new(&RecommendationConfig::default())
    }

    fn assert_sorted(items: &[RecommendationItem]) {
        for pair in items.windows(2) {
            assert!(pair[0].score >= pair[1].score, "{:?}", items);
        }
    }

    #[test]
    fn test_no_history_is_all_cold_start() {
        let items = recommender().recommend(&demo_catalog(), &[], 3);
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| i.source == RecommendationSource::ColdStart));
        assert!(items.iter().all(|i| i.reasons[0].starts_with("No viewing history yet")));
        assert_sorted(&items);
    }

    #[test]
    fn test_shortfall_fills_after_personalized() {
        let events = vec![InteractionEvent::new("u", "v1", EventType::Like)];
        let items = recommender().recommend(&demo_catalog(), &events, 3);

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].video_id, "v2");
        assert_eq!(items[0].source, RecommendationSource::Personalized);
        assert!(items[0].overlap_keywords.contains(&"redis".to_string()));

        assert!(items[1..].iter().all(|i| i.source == RecommendationSource::ColdStart));
        assert!(items[1].reasons[0].starts_with("Not enough new similar videos"));
        assert!(items[1].score < items[0].score);
        assert_sorted(&items);

        let ids: HashSet<&str> = items.iter().map(|i| i.video_id.as_str()).collect();
        assert_eq!(ids.len(), items.len());
        assert!(!ids.contains("v1"));
    }

    #[test]
    fn test_skip_excludes_without_personalizing() {
        let events = vec![InteractionEvent::new("u", "v3", EventType::Skip)];
        let items = recommender().recommend(&demo_catalog(), &events, 10);
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| i.video_id != "v3"));
        assert!(items.iter().all(|i| i.source == RecommendationSource::ColdStart));
    }

    #[test]
    fn test_everything_seen_gives_empty_list() {
        let events: Vec<InteractionEvent> = ["v1", "v2", "v3", "v4"]
            .iter()
            .map(|id| InteractionEvent::new("u", *id, EventType::Click))
            .collect();
        assert!(recommender().recommend(&demo_catalog(), &events, 5).is_empty());
    }

    #[test]
    fn test_zero_k_and_empty_catalog() {
        assert!(recommender().recommend(&demo_catalog(), &[], 0).is_empty());
        let empty = IndexedCatalog::build(Vec::new(), 25_000).unwrap();
        assert!(recommender().recommend(&empty, &[], 5).is_empty());
    }

    #[test]
    fn test_huge_k_is_bounded_by_catalog() {
        let events = vec![InteractionEvent::new("u", "v1", EventType::Like)];
        let items = recommender().recommend(&demo_catalog(), &events, usize::MAX);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].video_id, "v2");

        let cold = recommender().recommend(&demo_catalog(), &[], usize::MAX);
        assert_eq!(cold.len(), 4);
    }

    #[test]
    fn test_deterministic() {
        let events = vec![InteractionEvent::watch("u", "v2", 300)];
        let first = recommender().recommend(&demo_catalog(), &events, 4);
        let second = recommender().recommend(&demo_catalog(), &events, 4);
        assert_eq!(first, second);
    }
}
