//! Cache partition storage.
//!
//! Provides the partition store the strategies read and write:
//! - [`MemoryStorage`] for tests and ephemeral hosts
//! - [`SqliteStorage`] for partitions that must survive restarts
//!
//! plus the insertion-order eviction used by bounded partitions.

mod eviction;
mod memory;
mod sqlite;
mod traits;

pub use eviction::enforce_cap;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use traits::{CacheStorage, PartitionStats};
