//! Fallback ranking for users without a usable profile, and for filling the
//! tail of a response when too few similar videos remain.
//!
//! `cold_score = richness_weight * metadata_richness + recency_weight * recency`,
//! both signals normalized to `[0, 1]` across the whole catalog.

use super::scorer::rank_order;
use super::IndexedCatalog;
use crate::config::ColdStartConfig;
use std::collections::HashSet;

/// Which half of the blended score carried an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColdStartSignal {
    MetadataRichness,
    Recency,
}

/// Why the cold-start path ran for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColdStartTrigger {
    NoProfile,
    Shortfall,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColdStartCandidate {
    pub row: usize,
    pub video_id: String,
    pub score: f32,
    pub richness: f32,
    pub recency: f32,
    pub signal: ColdStartSignal,
}

#[derive(Debug, Clone)]
pub struct ColdStartRanker {
    richness_weight: f32,
    recency_weight: f32,
}

impl ColdStartRanker {
    pub fn new(config: &ColdStartConfig) -> Self {
        Self {
            richness_weight: config.richness_weight,
            recency_weight: config.recency_weight,
        }
    }

    pub fn rank(
        &self,
        catalog: &IndexedCatalog,
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Vec<ColdStartCandidate> {
        if limit == 0 || catalog.is_empty() {
            return Vec::new();
        }

        let index = &catalog.index;
        let nnz: Vec<usize> = (0..index.len())
            .map(|row| index.vector_at(row).map_or(0, |v| v.nnz()))
            .collect();
        let max_nnz = nnz.iter().copied().max().unwrap_or(0);

        let stamps: Vec<i64> = catalog
            .items
            .iter()
            .map(|item| item.recency_timestamp().timestamp_millis())
            .collect();
        let oldest = stamps.iter().copied().min().unwrap_or(0);
        let newest = stamps.iter().copied().max().unwrap_or(0);

        let mut candidates: Vec<ColdStartCandidate> = catalog
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| !exclude.contains(&item.id))
            .map(|(row, item)| {
                let richness = if max_nnz == 0 {
                    0.0
                } else {
                    nnz[row] as f32 / max_nnz as f32
                };
                let recency = if newest == oldest {
                    1.0
                } else {
                    ((stamps[row] - oldest) as f64 / (newest - oldest) as f64) as f32
                };

                let richness_part = self.richness_weight * richness;
                let recency_part = self.recency_weight * recency;
                let signal = if richness_part >= recency_part {
                    ColdStartSignal::MetadataRichness
                } else {
                    ColdStartSignal::Recency
                };

                ColdStartCandidate {
                    row,
                    video_id: item.id.clone(),
                    score: richness_part + recency_part,
                    richness,
                    recency,
                    signal,
                }
            })
            .collect();

        candidates.sort_by(|a, b| rank_order(a.score, &a.video_id, b.score, &b.video_id));
        candidates.truncate(limit);
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogItem;
    use chrono::{TimeZone, Utc};

    fn ranker() -> ColdStartRanker {
        ColdStartRanker::new(&ColdStartConfig::default())
    }

    fn day(d: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_rich_items_outrank_sparse_ones() {
        let items = vec![
            CatalogItem::new("sparse", "c1", "Redis").with_created_at(day(2)),
            CatalogItem::new("rich", "c1", "Postgres indexing deep dive")
                .with_description("Database indexing strategies for low latency systems")
                .with_created_at(day(1)),
        ];
        let catalog = IndexedCatalog::build(items, 25_000).unwrap();
        let ranked = ranker().rank(&catalog, &HashSet::new(), 10);

        assert_eq!(ranked[0].video_id, "rich");
        assert!((ranked[0].richness - 1.0).abs() < 1e-6);
        assert_eq!(ranked[0].recency, 0.0);
        assert_eq!(ranked[0].signal, ColdStartSignal::MetadataRichness);

        assert_eq!(ranked[1].video_id, "sparse");
        assert_eq!(ranked[1].recency, 1.0);
        assert_eq!(ranked[1].signal, ColdStartSignal::Recency);
    }

    #[test]
    fn test_recency_prefers_published_at_and_breaks_equal_richness() {
        let items = vec![
            CatalogItem::new("old", "c1", "redis cache")
                .with_created_at(day(20))
                .with_published_at(day(1)),
            CatalogItem::new("new", "c1", "redis cache").with_created_at(day(10)),
        ];
        let catalog = IndexedCatalog::build(items, 25_000).unwrap();
        let ranked = ranker().rank(&catalog, &HashSet::new(), 10);
        let ids: Vec<&str> = ranked.iter().map(|c| c.video_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn test_excludes_and_limits() {
        let items = vec![
            CatalogItem::new("a", "c1", "alpha").with_created_at(day(1)),
            CatalogItem::new("b", "c1", "beta").with_created_at(day(1)),
            CatalogItem::new("c", "c1", "gamma").with_created_at(day(1)),
        ];
        let catalog = IndexedCatalog::build(items, 25_000).unwrap();
        let exclude: HashSet<String> = ["a".to_string()].into_iter().collect();
        let ranked = ranker().rank(&catalog, &exclude, 1);
        // b and c tie exactly; id order decides.
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].video_id, "b");
    }

    #[test]
    fn test_zero_vectors_fall_back_to_recency() {
        let items = vec![CatalogItem::new("blank", "c1", "")];
        let catalog = IndexedCatalog::build(items, 25_000).unwrap();
        let ranked = ranker().rank(&catalog, &HashSet::new(), 5);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].richness, 0.0);
        assert_eq!(ranked[0].signal, ColdStartSignal::Recency);
        assert!(ranked[0].score > 0.0 && ranked[0].score <= 1.0);
    }
}
