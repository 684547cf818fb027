//! SQLite-backed cache storage.
//!
//! Partitions survive restarts, which is what lets a new deployment find and
//! delete the partitions of the previous one on activation.

use super::traits::{CacheStorage, PartitionStats};
use crate::error::{Result, SwError};
use crate::models::{RequestKey, Response};
use bytes::Bytes;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// SQLite cache storage.
///
/// Thread-safe via internal mutex on the connection. Insertion order is
/// tracked with a monotonically increasing `seq` column.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) a storage database at the given path.
    pub fn open_path(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SwError::storage(format!(
                        "Failed to create storage directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(db_path).map_err(|e| SwError::Storage {
            message: format!("Failed to open storage database: {}", e),
            source: Some(e),
        })?;

        // WAL for concurrent readers
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| SwError::Storage {
                message: format!("Failed to set pragmas: {}", e),
                source: Some(e),
            })?;

        Self::with_connection(conn)
    }

    /// Storage that lives only as long as this value.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let storage = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_partitions (
                name TEXT PRIMARY KEY,
                seq INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS cache_responses (
                partition TEXT NOT NULL,
                key TEXT NOT NULL,
                seq INTEGER NOT NULL,
                status INTEGER NOT NULL,
                headers TEXT NOT NULL,
                body BLOB NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (partition, key)
            );

            -- Oldest-first key listing for eviction
            CREATE INDEX IF NOT EXISTS idx_responses_order
                ON cache_responses(partition, seq);
            "#,
        )
        .map_err(|e| SwError::Storage {
            message: format!("Failed to initialize storage schema: {}", e),
            source: Some(e),
        })?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SwError::storage(format!("Failed to lock database: {}", e)))
    }

    fn ensure_partition(conn: &Connection, partition: &str) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO cache_partitions (name, seq, created_at)
             VALUES (?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM cache_partitions), ?2)",
            params![partition, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn insert_response(
        tx: &Transaction<'_>,
        partition: &str,
        key: &RequestKey,
        response: &Response,
    ) -> Result<()> {
        let headers = serde_json::to_string(&response.headers)?;
        tx.execute(
            "INSERT OR REPLACE INTO cache_responses
                (partition, key, seq, status, headers, body, cached_at)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(seq), 0) + 1 FROM cache_responses),
                     ?3, ?4, ?5, ?6)",
            params![
                partition,
                key.as_str(),
                response.status,
                headers,
                response.body.as_ref(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl CacheStorage for SqliteStorage {
    fn open(&self, partition: &str) -> Result<()> {
        let conn = self.lock()?;
        Self::ensure_partition(&conn, partition)
    }

    fn partition_names(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name FROM cache_partitions ORDER BY seq")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn delete_partition(&self, partition: &str) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let entries = tx.execute(
            "DELETE FROM cache_responses WHERE partition = ?1",
            params![partition],
        )?;
        let removed = tx.execute(
            "DELETE FROM cache_partitions WHERE name = ?1",
            params![partition],
        )?;
        tx.commit()?;
        debug!("Deleted partition {} ({} entries)", partition, entries);
        Ok(removed > 0)
    }

    fn put(&self, partition: &str, key: &RequestKey, response: &Response) -> Result<()> {
        self.put_all(partition, std::slice::from_ref(&(key.clone(), response.clone())))
    }

    fn put_all(&self, partition: &str, entries: &[(RequestKey, Response)]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::ensure_partition(&tx, partition)?;
        for (key, response) in entries {
            Self::insert_response(&tx, partition, key, response)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get(&self, partition: &str, key: &RequestKey) -> Result<Option<Response>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT status, headers, body FROM cache_responses
                 WHERE partition = ?1 AND key = ?2",
                params![partition, key.as_str()],
                |row| {
                    Ok((
                        row.get::<_, u16>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((status, headers, body)) => Ok(Some(Response {
                status,
                headers: serde_json::from_str(&headers)?,
                body: Bytes::from(body),
            })),
            None => Ok(None),
        }
    }

    fn keys(&self, partition: &str) -> Result<Vec<RequestKey>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT key FROM cache_responses WHERE partition = ?1 ORDER BY seq")?;
        let keys = stmt
            .query_map(params![partition], |row| row.get::<_, String>(0))?
            .map(|k| k.map(RequestKey::from_stored))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn delete(&self, partition: &str, key: &RequestKey) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM cache_responses WHERE partition = ?1 AND key = ?2",
            params![partition, key.as_str()],
        )?;
        Ok(removed > 0)
    }

    fn len(&self, partition: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM cache_responses WHERE partition = ?1",
            params![partition],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn stats(&self) -> Result<Vec<PartitionStats>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT p.name, COUNT(r.key), COALESCE(SUM(LENGTH(r.body)), 0)
             FROM cache_partitions p
             LEFT JOIN cache_responses r ON r.partition = p.name
             GROUP BY p.name
             ORDER BY p.seq",
        )?;
        let stats = stmt
            .query_map([], |row| {
                Ok(PartitionStats {
                    name: row.get(0)?,
                    entry_count: row.get::<_, i64>(1)? as usize,
                    total_size_bytes: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(stats)
    }
}
