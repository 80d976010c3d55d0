//! In-process partitioned store.
//!
//! Rows are spread over hash-selected shards. Each shard has its own lock,
//! so `insert_if_absent` is atomic per key without serializing unrelated
//! keys behind one mutex.

use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use parking_lot::Mutex;

use common::{AppResult, OptionExt};

use super::{Deadline, Row, RowKey, StorageAdapter, Table};

const SHARD_COUNT: usize = 16;

type Shard = Mutex<HashMap<RowKey, Row>>;

pub struct MemoryStore {
    shards: Vec<Shard>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_shards(SHARD_COUNT)
    }

    pub fn with_shards(count: usize) -> Self {
        let shards = (0..count.max(1))
            .map(|_| Mutex::new(HashMap::new()))
            .collect();
        Self { shards }
    }

    fn shard(&self, key: &RowKey) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.shards.len();
        &self.shards[index]
    }

    /// Number of rows currently held in `table`.
    pub fn count(&self, table: Table) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().keys().filter(|k| k.table() == table).count())
            .sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStore {
    async fn insert_if_absent(&self, row: Row, deadline: Deadline) -> AppResult<bool> {
        deadline.check("insert_if_absent")?;
        let key = row.key();
        let mut shard = self.shard(&key).lock();
        match shard.entry(key) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(row);
                Ok(true)
            }
        }
    }

    async fn get(&self, key: RowKey, deadline: Deadline) -> AppResult<Row> {
        deadline.check("get")?;
        self.shard(&key)
            .lock()
            .get(&key)
            .cloned()
            .ok_or_not_found()
    }

    async fn put(&self, row: Row, deadline: Deadline) -> AppResult<()> {
        deadline.check("put")?;
        let key = row.key();
        self.shard(&key).lock().insert(key, row);
        Ok(())
    }

    async fn delete(&self, key: RowKey, deadline: Deadline) -> AppResult<()> {
        deadline.check("delete")?;
        self.shard(&key).lock().remove(&key);
        Ok(())
    }

    async fn ping(&self, deadline: Deadline) -> AppResult<()> {
        deadline.check("ping")
    }
}
