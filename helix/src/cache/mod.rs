//! Cache port for fetched items and pages.
//!
//! The resolver never owns cache state: it is handed an `Arc<dyn Cache<String, Vec<u8>>>`
//! at construction and only issues `get`/`set`. Failures are reported as [`CacheError`]
//! and treated by the resolver as misses, never as fatal errors.
//!
//! Keys are namespaced per resource type: see [`cache_key`].

mod error;
mod in_memory;
mod sqlite;

pub use error::CacheError;
pub use in_memory::InMemoryCache;
pub use sqlite::SqliteCache;

use async_trait::async_trait;
use std::fmt::Display;
use std::time::Duration;

/// Cache trait for key-value storage with optional TTL.
///
/// Implementations must be safe to share across tasks; the resolver may issue
/// `set` calls for different keys concurrently.
#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Clone + Send + Sync,
{
    /// Get a value from the cache by key.
    ///
    /// Returns `Ok(None)` if the key is not found or has expired.
    async fn get(&self, key: &K) -> Result<Option<V>, CacheError>;

    /// Set a value in the cache with an optional TTL.
    ///
    /// If `ttl` is `None`, the value will not expire.
    async fn set(&self, key: K, value: V, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Delete a value from the cache.
    async fn delete(&self, key: &K) -> Result<(), CacheError>;

    /// Clear all entries from the cache.
    async fn clear(&self) -> Result<(), CacheError>;
}

/// Byte-valued cache as injected into the resolver and the HTTP fetcher.
pub type ByteCache = dyn Cache<String, Vec<u8>>;

/// Builds the namespaced key for one item: `"<namespace>.<id>"`.
pub fn cache_key(namespace: &str, id: impl Display) -> String {
    format!("{}.{}", namespace, id)
}
