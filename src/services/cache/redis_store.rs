use super::CacheStore;
use crate::error::RecResult;
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::Client;
use tracing::debug;

/// Cache handler backed by Redis. Each call takes a multiplexed connection
/// from the client.
#[derive(Clone)]
pub struct RedisCacheStore {
    client: Client,
}

impl RedisCacheStore {
    pub fn new(redis_url: &str) -> RecResult<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn ping(&self) -> RecResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> RecResult<Option<Vec<u8>>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let cached: Option<Vec<u8>> = conn.get(key).await?;
        Ok(cached)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> RecResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_seconds.max(1))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete_matching(&self, pattern: &str) -> RecResult<usize> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let keys: Vec<String> = {
            let mut iter = conn.scan_match::<_, String>(pattern).await?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        if keys.is_empty() {
            return Ok(0);
        }

        let deleted: usize = conn.del(&keys).await?;
        debug!(pattern, deleted, "Deleted cache keys");
        Ok(deleted)
    }
}
