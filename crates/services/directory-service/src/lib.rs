//! Identity Directory Library
//!
//! Account storage across three independently keyed tables with
//! conditional-write uniqueness, plus a coherent cache in front of it.
//! The gateway embeds it in-process through [`DirectoryService`].

pub mod cache;
pub mod config;
pub mod infra;
pub mod service;
pub mod storage;

use std::sync::Arc;

use tracing::info;

use crate::cache::{CacheAdapter, MemoryCache, RedisCache};
use crate::config::{CacheBackend, DirectoryConfig, StorageBackend};
use crate::infra::Database;
use crate::storage::{MemoryStore, SeaOrmStore, StorageAdapter};

pub use crate::service::{Directory, DirectoryService, HealthReport};

/// Connect the configured backends and assemble a directory.
pub async fn build_directory(
    config: &DirectoryConfig,
) -> Result<Directory, Box<dyn std::error::Error>> {
    let storage: Arc<dyn StorageAdapter> = match config.storage_backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Postgres => {
            let db = Database::connect(&config.database).await?;
            Arc::new(SeaOrmStore::new(db.get_connection()))
        }
    };

    let cache: Arc<dyn CacheAdapter> = match config.cache_backend {
        CacheBackend::Memory => {
            info!("Using in-memory cache");
            Arc::new(MemoryCache::new())
        }
        CacheBackend::Redis => Arc::new(RedisCache::connect(&config.cache.url).await?),
    };

    Ok(Directory::new(
        storage,
        cache,
        config.resilience.clone(),
        config.cache.ttl(),
    ))
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = DirectoryConfig::from_env();
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}
