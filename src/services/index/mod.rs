use crate::algorithms::{CatalogFingerprint, IndexedCatalog};
use crate::error::{RecError, RecResult};
use crate::models::CatalogItem;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Holds the index for the latest catalog snapshot and rebuilds it when the
/// snapshot's fingerprint changes. Only one rebuild runs at a time; callers
/// arriving during a rebuild wait for it and reuse the result.
pub struct IndexManager {
    max_features: usize,
    current: RwLock<Option<Arc<IndexedCatalog>>>,
    build_lock: Mutex<()>,
    builds: AtomicU64,
}

impl IndexManager {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            current: RwLock::new(None),
            build_lock: Mutex::new(()),
            builds: AtomicU64::new(0),
        }
    }

    /// Number of fits performed since startup.
    pub fn builds(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }

    pub fn current(&self) -> Option<Arc<IndexedCatalog>> {
        self.current.read().clone()
    }

    fn matching(&self, fingerprint: CatalogFingerprint) -> Option<Arc<IndexedCatalog>> {
        self.current
            .read()
            .as_ref()
            .filter(|catalog| catalog.fingerprint() == fingerprint)
            .cloned()
    }

    pub async fn get_or_build(&self, items: Vec<CatalogItem>) -> RecResult<Arc<IndexedCatalog>> {
        let fingerprint = CatalogFingerprint::of(&items);
        if let Some(catalog) = self.matching(fingerprint) {
            return Ok(catalog);
        }

        let _guard = self.build_lock.lock().await;
        if let Some(catalog) = self.matching(fingerprint) {
            debug!("Reusing index built by a concurrent request");
            return Ok(catalog);
        }

        let started = Instant::now();
        let max_features = self.max_features;
        let catalog = tokio::task::spawn_blocking(move || IndexedCatalog::build(items, max_features))
            .await
            .map_err(|e| RecError::Internal(format!("Index build task failed: {}", e)))??;

        let catalog = Arc::new(catalog);
        *self.current.write() = Some(catalog.clone());
        self.builds.fetch_add(1, Ordering::Relaxed);

        info!(
            "Built index over {} videos with {} terms in {:?}",
            catalog.len(),
            catalog.index.dimension(),
            started.elapsed()
        );
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn items() -> Vec<CatalogItem> {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        vec![
            CatalogItem::new("v1", "c1", "Redis caching").with_created_at(created),
            CatalogItem::new("v2", "c1", "Postgres indexing").with_created_at(created),
        ]
    }

    #[tokio::test]
    async fn test_reuses_index_for_same_snapshot() {
        let manager = IndexManager::new(25_000);
        let first = manager.get_or_build(items()).await.unwrap();
        let second = manager.get_or_build(items()).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.builds(), 1);
    }

    #[tokio::test]
    async fn test_rebuilds_when_catalog_changes() {
        let manager = IndexManager::new(25_000);
        manager.get_or_build(items()).await.unwrap();

        let mut changed = items();
        changed.push(CatalogItem::new("v3", "c2", "Cosine similarity"));
        let rebuilt = manager.get_or_build(changed).await.unwrap();
        assert_eq!(rebuilt.len(), 3);
        assert_eq!(manager.builds(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_share_one_build() {
        let manager = Arc::new(IndexManager::new(25_000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.get_or_build(items()).await })
            })
            .collect();

        for handle in futures::future::join_all(handles).await {
            handle.unwrap().unwrap();
        }
        assert_eq!(manager.builds(), 1);
    }

    #[tokio::test]
    async fn test_build_failure_is_reported_and_not_cached() {
        let manager = IndexManager::new(25_000);
        let duplicated = vec![
            CatalogItem::new("v1", "c1", "one"),
            CatalogItem::new("v1", "c1", "two"),
        ];
        let err = manager.get_or_build(duplicated).await.unwrap_err();
        assert!(matches!(err, RecError::IndexBuild(_)));
        assert!(manager.current().is_none());
        assert_eq!(manager.builds(), 0);
    }
}
