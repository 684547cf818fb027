//! Entry-count caps for bounded partitions.
//!
//! Eviction is by insertion order (the order `keys` returns), used as a
//! stand-in for recency: an old entry that is read often is still evicted
//! first. This is a known approximation of LRU and is kept deliberately.

use super::traits::CacheStorage;
use crate::error::Result;
use tracing::debug;

/// Trim `partition` to at most `max_entries`, oldest entries first.
///
/// The key list is re-read here, immediately before trimming, so writes made
/// by other handlers since the caller's own write are accounted for.
/// Returns the number of evicted entries.
pub fn enforce_cap(
    storage: &dyn CacheStorage,
    partition: &str,
    max_entries: usize,
) -> Result<usize> {
    let keys = storage.keys(partition)?;
    if keys.len() <= max_entries {
        return Ok(0);
    }

    let excess = keys.len() - max_entries;
    let mut evicted = 0;
    for key in &keys[..excess] {
        if storage.delete(partition, key)? {
            evicted += 1;
        }
    }

    debug!(
        "Evicted {} entries from {} (cap {})",
        evicted, partition, max_entries
    );
    Ok(evicted)
}
