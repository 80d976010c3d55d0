//! Directory configuration.

use std::env;
use std::fmt;
use std::str::FromStr;

use common::{CacheConfig, DatabaseConfig, ResilienceConfig};

/// Which storage adapter backs the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// Which cache adapter fronts the accounts table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Redis,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

/// Directory configuration.
#[derive(Clone)]
pub struct DirectoryConfig {
    pub storage_backend: StorageBackend,
    pub cache_backend: CacheBackend,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub resilience: ResilienceConfig,
}

impl DirectoryConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let resilience = defaults.resilience;

        Self {
            storage_backend: env_or("STORAGE_BACKEND", defaults.storage_backend),
            cache_backend: env_or("CACHE_BACKEND", defaults.cache_backend),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    defaults.database.min_connections,
                ),
            },
            cache: CacheConfig {
                url: env::var("REDIS_URL").unwrap_or(defaults.cache.url),
                default_ttl_seconds: env_or("CACHE_TTL_SECONDS", defaults.cache.default_ttl_seconds),
            },
            resilience: ResilienceConfig {
                storage_timeout_ms: env_or("STORAGE_TIMEOUT_MS", resilience.storage_timeout_ms),
                cache_timeout_ms: env_or("CACHE_TIMEOUT_MS", resilience.cache_timeout_ms),
                read_retries: env_or("READ_RETRIES", resilience.read_retries),
                retry_backoff_ms: env_or("RETRY_BACKOFF_MS", resilience.retry_backoff_ms),
                max_discriminator_attempts: env_or(
                    "MAX_DISCRIMINATOR_ATTEMPTS",
                    resilience.max_discriminator_attempts,
                ),
                dangling_index_grace_seconds: env_or(
                    "DANGLING_INDEX_GRACE_SECONDS",
                    resilience.dangling_index_grace_seconds,
                ),
            },
        }
    }
}

/// Parse `key` from the environment, keeping `default` when unset or invalid.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable configuration value");
            default
        }),
        Err(_) => default,
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::Memory,
            cache_backend: CacheBackend::Memory,
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            resilience: ResilienceConfig::default(),
        }
    }
}

// Connection URLs may embed credentials.
impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("storage_backend", &self.storage_backend)
            .field("cache_backend", &self.cache_backend)
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("cache_ttl_seconds", &self.cache.default_ttl_seconds)
            .field("resilience", &self.resilience)
            .finish()
    }
}
