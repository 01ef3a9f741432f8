use redis::AsyncCommands;
use redis::Client;

use crate::db::BlobStore;
use crate::error::{AppError, AppResult};

/// Creates a Redis client for the blob store
///
/// Opening the client does not connect; the first command does.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Blob store backed by plain Redis string keys
///
/// Keys are namespaced with a prefix so several deployments can share one
/// Redis database.
#[derive(Clone)]
pub struct RedisBlobStore {
    redis_client: Client,
    prefix: String,
}

impl RedisBlobStore {
    pub fn new(redis_client: Client) -> Self {
        Self::with_prefix(redis_client, "moodflix")
    }

    pub fn with_prefix(redis_client: Client, prefix: impl Into<String>) -> Self {
        Self {
            redis_client,
            prefix: prefix.into(),
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

#[async_trait::async_trait]
impl BlobStore for RedisBlobStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let stored: Option<String> = conn.get(self.namespaced(key)).await.map_err(|e| {
            tracing::warn!(error = %e, key = %key, "Redis get failed");
            e
        })?;
        Ok(stored)
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let result: redis::RedisResult<()> = conn.set(self.namespaced(key), value).await;
        result.map_err(|e| {
            tracing::error!(error = %e, key = %key, "Failed to write blob to Redis");
            AppError::Storage(format!("Redis write failed for {}: {}", key, e))
        })
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
