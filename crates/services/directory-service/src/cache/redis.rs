//! Redis cache adapter.

use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use tracing::debug;

use common::{AppError, AppResult};

use super::CacheAdapter;

/// Redis cache wrapper with connection pooling.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        debug!("Connecting to Redis");
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        tracing::info!("Redis cache connected");
        Ok(Self { connection })
    }
}

fn cache_error(err: RedisError) -> AppError {
    AppError::cache(err.to_string())
}

#[async_trait]
impl CacheAdapter for RedisCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(cache_error)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(cache_error)
    }

    async fn invalidate(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(key).await.map_err(cache_error)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }
}
