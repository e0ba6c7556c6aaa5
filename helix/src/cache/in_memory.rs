//! In-memory cache. Not persistent; entries live as long as the process.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Cache, CacheError};

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| now >= at).unwrap_or(false)
    }
}

/// In-memory [`Cache`] backed by a `HashMap` behind a `RwLock`.
///
/// Expired entries are reported as misses and dropped lazily on the next write
/// to the same key.
///
/// ## Example
///
/// ```rust
/// use helix::cache::{Cache, InMemoryCache};
///
/// # #[tokio::main]
/// # async fn main() {
/// let cache: InMemoryCache<String, Vec<u8>> = InMemoryCache::new();
/// cache.set("helix.clip.1".into(), b"{}".to_vec(), None).await.unwrap();
/// assert!(cache.get(&"helix.clip.1".to_string()).await.unwrap().is_some());
/// # }
/// ```
pub struct InMemoryCache<K, V> {
    inner: Arc<RwLock<HashMap<K, Entry<V>>>>,
}

impl<K, V> InMemoryCache<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of live (non-expired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .read()
            .await
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    /// True when no live entries remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<K, V> Default for InMemoryCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for InMemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<V>, CacheError> {
        let cache = self.inner.read().await;
        Ok(cache
            .get(key)
            .filter(|e| !e.is_expired(Instant::now()))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: K, value: V, ttl: Option<Duration>) -> Result<(), CacheError> {
        // A TTL past the clock's range never expires.
        let expires_at = ttl.and_then(|d| Instant::now().checked_add(d));
        self.inner
            .write()
            .await
            .insert(key, Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &K) -> Result<(), CacheError> {
        self.inner.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.inner.write().await.clear();
        Ok(())
    }
}
