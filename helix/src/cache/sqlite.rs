//! SQLite-backed cache (SqliteCache). Persistent across process restarts, so a second
//! CLI run can resolve previously fetched items without a remote call.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use super::{Cache, CacheError};

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// SQLite-backed [`Cache`]. Key: TEXT, value: BLOB, optional expiry in epoch millis.
///
/// Opens a connection per operation inside `spawn_blocking`, so it is usable from any
/// tokio runtime flavor.
pub struct SqliteCache {
    db_path: PathBuf,
}

impl SqliteCache {
    /// Opens or creates the database file and ensures the table exists.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let db_path = path.as_ref().to_path_buf();
        let conn = rusqlite::Connection::open(&db_path)?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS cache_kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                expires_at INTEGER
            )
            "#,
            [],
        )?;
        Ok(Self { db_path })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> Result<T, CacheError> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path)?;
            f(&conn)
        })
        .await
        .map_err(|e| CacheError::Storage(e.to_string()))?
    }
}

#[async_trait]
impl Cache<String, Vec<u8>> for SqliteCache {
    async fn get(&self, key: &String) -> Result<Option<Vec<u8>>, CacheError> {
        let key = key.clone();
        self.with_conn(move |conn| {
            let row: Option<(Vec<u8>, Option<i64>)> = conn
                .query_row(
                    "SELECT value, expires_at FROM cache_kv WHERE key = ?1",
                    params![key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            Ok(match row {
                Some((_, Some(expires_at))) if expires_at <= now_millis() => None,
                Some((value, _)) => Some(value),
                None => None,
            })
        })
        .await
    }

    async fn set(
        &self,
        key: String,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let expires_at = ttl.and_then(|d| {
            i64::try_from(d.as_millis())
                .ok()
                .and_then(|ms| now_millis().checked_add(ms))
        });
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO cache_kv (key, value, expires_at) VALUES (?1, ?2, ?3)",
                params![key, value, expires_at],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &String) -> Result<(), CacheError> {
        let key = key.clone();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM cache_kv WHERE key = ?1", params![key])?;
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM cache_kv", [])?;
            Ok(())
        })
        .await
    }
}
