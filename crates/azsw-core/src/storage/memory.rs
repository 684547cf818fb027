//! In-memory cache storage.

use super::traits::{CacheStorage, PartitionStats};
use crate::error::{Result, SwError};
use crate::models::{RequestKey, Response};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Partition {
    entries: HashMap<RequestKey, Response>,
    order: VecDeque<RequestKey>, // insertion order, oldest first
}

impl Partition {
    fn insert(&mut self, key: &RequestKey, response: &Response) {
        if self.entries.insert(key.clone(), response.clone()).is_some() {
            self.order.retain(|k| k != key);
        }
        self.order.push_back(key.clone());
    }
}

#[derive(Default)]
struct State {
    partitions: HashMap<String, Partition>,
    names: Vec<String>, // creation order
}

impl State {
    fn partition_mut(&mut self, name: &str) -> &mut Partition {
        if !self.partitions.contains_key(name) {
            self.names.push(name.to_string());
        }
        self.partitions.entry(name.to_string()).or_default()
    }
}

/// Process-local storage; contents vanish with the process.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<State>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.inner
            .lock()
            .map_err(|e| SwError::storage(format!("Failed to lock memory storage: {}", e)))
    }
}

impl CacheStorage for MemoryStorage {
    fn open(&self, partition: &str) -> Result<()> {
        self.lock()?.partition_mut(partition);
        Ok(())
    }

    fn partition_names(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.names.clone())
    }

    fn delete_partition(&self, partition: &str) -> Result<bool> {
        let mut st = self.lock()?;
        if st.partitions.remove(partition).is_some() {
            st.names.retain(|n| n != partition);
            return Ok(true);
        }
        Ok(false)
    }

    fn put(&self, partition: &str, key: &RequestKey, response: &Response) -> Result<()> {
        self.lock()?.partition_mut(partition).insert(key, response);
        Ok(())
    }

    fn put_all(&self, partition: &str, entries: &[(RequestKey, Response)]) -> Result<()> {
        // A single lock covers the batch, so no reader sees a partial write.
        let mut st = self.lock()?;
        let target = st.partition_mut(partition);
        for (key, response) in entries {
            target.insert(key, response);
        }
        Ok(())
    }

    fn get(&self, partition: &str, key: &RequestKey) -> Result<Option<Response>> {
        let st = self.lock()?;
        Ok(st
            .partitions
            .get(partition)
            .and_then(|p| p.entries.get(key))
            .cloned())
    }

    fn keys(&self, partition: &str) -> Result<Vec<RequestKey>> {
        let st = self.lock()?;
        Ok(st
            .partitions
            .get(partition)
            .map(|p| p.order.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn delete(&self, partition: &str, key: &RequestKey) -> Result<bool> {
        let mut st = self.lock()?;
        let Some(p) = st.partitions.get_mut(partition) else {
            return Ok(false);
        };
        if p.entries.remove(key).is_some() {
            p.order.retain(|k| k != key);
            return Ok(true);
        }
        Ok(false)
    }

    fn stats(&self) -> Result<Vec<PartitionStats>> {
        let st = self.lock()?;
        Ok(st
            .names
            .iter()
            .filter_map(|name| {
                st.partitions.get(name).map(|p| PartitionStats {
                    name: name.clone(),
                    entry_count: p.entries.len(),
                    total_size_bytes: p.entries.values().map(|r| r.body.len() as u64).sum(),
                })
            })
            .collect())
    }
}
