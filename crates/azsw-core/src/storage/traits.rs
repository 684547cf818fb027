//! Cache storage trait and types.

use crate::error::Result;
use crate::models::{RequestKey, Response};
use serde::{Deserialize, Serialize};

/// Summary of one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionStats {
    /// Partition name.
    pub name: String,
    /// Number of stored responses.
    pub entry_count: usize,
    /// Total body size in bytes.
    pub total_size_bytes: u64,
}

/// Named key/value partitions of whole responses.
///
/// Mirrors the browser Cache Storage model: partitions are created on first
/// open, keys are request identities, and `keys` lists entries oldest
/// insertion first. Writing an existing key replaces the response and makes
/// it the newest entry.
///
/// All operations are synchronous; implementations guard their state with
/// an internal mutex so one storage can be shared by concurrent handlers.
pub trait CacheStorage: Send + Sync {
    /// Create the partition if it does not exist yet.
    fn open(&self, partition: &str) -> Result<()>;

    /// Partition names in creation order.
    fn partition_names(&self) -> Result<Vec<String>>;

    /// Delete a partition and all of its entries.
    ///
    /// Returns `false` if it did not exist.
    fn delete_partition(&self, partition: &str) -> Result<bool>;

    /// Store a response, creating the partition if needed.
    fn put(&self, partition: &str, key: &RequestKey, response: &Response) -> Result<()>;

    /// Store several responses as one unit: either all are written or none.
    fn put_all(&self, partition: &str, entries: &[(RequestKey, Response)]) -> Result<()>;

    /// Look up a response in one partition.
    fn get(&self, partition: &str, key: &RequestKey) -> Result<Option<Response>>;

    /// Keys of a partition, oldest insertion first. Empty if it does not exist.
    fn keys(&self, partition: &str) -> Result<Vec<RequestKey>>;

    /// Delete one entry. Returns `false` if it was not present.
    fn delete(&self, partition: &str, key: &RequestKey) -> Result<bool>;

    /// Per-partition entry counts and sizes, in creation order.
    fn stats(&self) -> Result<Vec<PartitionStats>>;

    /// Number of entries in a partition.
    fn len(&self, partition: &str) -> Result<usize> {
        Ok(self.keys(partition)?.len())
    }

    /// Look up a response in every partition, in creation order.
    fn match_any(&self, key: &RequestKey) -> Result<Option<Response>> {
        for name in self.partition_names()? {
            if let Some(response) = self.get(&name, key)? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}
