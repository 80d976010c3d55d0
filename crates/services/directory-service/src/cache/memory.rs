//! In-process TTL cache.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use common::AppResult;

use super::CacheAdapter;

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Size at which `set` first sweeps expired entries.
const SWEEP_THRESHOLD: usize = 1024;

struct Entries {
    map: HashMap<String, CacheEntry>,
    /// Next size that triggers a sweep; doubles with the live set.
    sweep_at: usize,
}

impl Default for Entries {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            sweep_at: SWEEP_THRESHOLD,
        }
    }
}

impl Entries {
    fn insert(&mut self, key: String, entry: CacheEntry) {
        self.map.insert(key, entry);
        if self.map.len() >= self.sweep_at {
            let now = Instant::now();
            self.map.retain(|_, entry| entry.expires_at > now);
            self.sweep_at = (self.map.len() * 2).max(SWEEP_THRESHOLD);
        }
    }
}

/// Expired entries are dropped on read, and swept from `set` whenever the
/// map reaches its next sweep size.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<Entries>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn with_sweep_threshold(threshold: usize) -> Self {
        let entries = Entries {
            map: HashMap::new(),
            sweep_at: threshold,
        };
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheAdapter for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut guard = self.entries.lock();
        let entries = &mut guard.map;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> AppResult<()> {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> AppResult<()> {
        self.entries.lock().map.remove(key);
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
