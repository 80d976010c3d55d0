//! Cache layer in front of the `accounts` table.
//!
//! The cache is never authoritative. Values are JSON-encoded accounts keyed
//! by [`account_key`]; callers treat every cache error as a miss.

mod memory;
mod redis;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use common::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Cache key prefix for account records
pub const CACHE_PREFIX_ACCOUNT: &str = "account:";

pub fn account_key(id: Uuid) -> String {
    format!("{}{}", CACHE_PREFIX_ACCOUNT, id)
}

/// Key/value cache adapter.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CacheAdapter: Send + Sync {
    /// `Some` on hit
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> AppResult<()>;

    /// Remove a key. Removing an absent key succeeds.
    async fn invalidate(&self, key: &str) -> AppResult<()>;

    async fn ping(&self) -> AppResult<()>;
}
