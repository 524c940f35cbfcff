pub mod memory;
pub mod redis_store;

pub use memory::InMemoryCacheStore;
pub use redis_store::RedisCacheStore;

use crate::error::RecResult;
use async_trait::async_trait;

/// Opaque key-value backend for serialized responses.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> RecResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> RecResult<()>;

    /// Deletes every key matching a Redis-style glob and returns how many went.
    async fn delete_matching(&self, pattern: &str) -> RecResult<usize>;
}

/// Cache that stores nothing; every read is a miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCacheStore;

#[async_trait]
impl CacheStore for NoopCacheStore {
    async fn get(&self, _key: &str) -> RecResult<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl_seconds: u64) -> RecResult<()> {
        Ok(())
    }

    async fn delete_matching(&self, _pattern: &str) -> RecResult<usize> {
        Ok(0)
    }
}
