use super::CacheStore;
use crate::error::RecResult;
use crate::utils::glob_match;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Writes between full sweeps of expired entries.
const SWEEP_EVERY: usize = 64;

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-process cache with per-entry expiry. Expired entries are dropped
/// lazily on read and on pattern deletes, and swept every `SWEEP_EVERY`
/// writes so keys that are never read again still get freed.
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: DashMap<String, Entry>,
    writes: AtomicUsize,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> RecResult<Option<Vec<u8>>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> RecResult<()> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_seconds);
        self.entries.insert(key.to_string(), Entry { value, expires_at });
        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0 {
            self.sweep_expired();
        }
        Ok(())
    }

    async fn delete_matching(&self, pattern: &str) -> RecResult<usize> {
        let now = Instant::now();
        let mut deleted = 0;
        self.entries.retain(|key, entry| {
            if entry.expires_at <= now {
                return false;
            }
            if glob_match(pattern, key) {
                deleted += 1;
                return false;
            }
            true
        });
        Ok(deleted)
    }
}
