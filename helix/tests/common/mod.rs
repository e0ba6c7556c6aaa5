//! Shared fakes for resolver tests: scripted page fetcher and instrumented caches.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use helix::{
    ByteCache, Cache, CacheError, ClipId, Cursor, FetchError, FilterValue, InMemoryCache, Page,
    PageFetcher, PageRequest,
};
use serde_json::json;

pub fn id(v: u64) -> ClipId {
    ClipId::try_from(v).unwrap()
}

pub fn clip_json(id: u64) -> serde_json::Value {
    json!({
        "id": id.to_string(),
        "title": format!("clip {}", id),
        "broadcaster_id": "1001",
        "view_count": id * 10,
    })
}

/// A page of `n` clips numbered from `start`.
pub fn page_of(start: u64, n: u64, cursor: Option<&str>) -> Page {
    Page::new(
        (start..start + n).map(clip_json).collect(),
        cursor.map(Cursor::from),
    )
}

type Responder = dyn Fn(&PageRequest, usize) -> Result<Page, FetchError> + Send + Sync;

/// Records every request and answers with a scripted responder (`call` is 0-based).
pub struct MockFetcher {
    requests: Mutex<Vec<PageRequest>>,
    responder: Box<Responder>,
}

impl MockFetcher {
    pub fn new(
        responder: impl Fn(&PageRequest, usize) -> Result<Page, FetchError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Answers ID lookups with one clip per requested id, skipping `missing`.
    pub fn echo_ids(missing: &[u64]) -> Self {
        let missing: HashSet<u64> = missing.iter().copied().collect();
        Self::new(move |req, _| {
            let data = requested_ids(req)
                .into_iter()
                .map(|s| s.parse::<u64>().unwrap())
                .filter(|v| !missing.contains(v))
                .map(clip_json)
                .collect();
            Ok(Page::new(data, None))
        })
    }

    /// Serves `pages` in order, then empty exhausted pages.
    pub fn pages(pages: Vec<Page>) -> Self {
        Self::new(move |_, call| Ok(pages.get(call).cloned().unwrap_or_default()))
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The `id` values of each request, in call order.
    pub fn id_batches(&self) -> Vec<Vec<String>> {
        self.requests().iter().map(requested_ids).collect()
    }
}

pub fn requested_ids(req: &PageRequest) -> Vec<String> {
    match req.filters.get("id") {
        Some(FilterValue::Many(ids)) => ids.clone(),
        Some(FilterValue::One(id)) => vec![id.clone()],
        None => Vec::new(),
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<Page, FetchError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };
        (self.responder)(request, call)
    }
}

/// Wraps an in-memory cache and counts reads, hits and writes.
#[derive(Default)]
pub struct CountingCache {
    inner: InMemoryCache<String, Vec<u8>>,
    pub gets: AtomicUsize,
    pub hits: AtomicUsize,
    pub sets: AtomicUsize,
}

impl CountingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub async fn warm(&self, ids: &[u64]) {
        for id in ids {
            self.inner
                .set(
                    format!("helix.clip.{}", id),
                    serde_json::to_vec(&clip_json(*id)).unwrap(),
                    None,
                )
                .await
                .unwrap();
        }
    }

    pub async fn contains(&self, id: u64) -> bool {
        self.inner
            .get(&format!("helix.clip.{}", id))
            .await
            .unwrap()
            .is_some()
    }
}

#[async_trait]
impl Cache<String, Vec<u8>> for CountingCache {
    async fn get(&self, key: &String) -> Result<Option<Vec<u8>>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let value = self.inner.get(key).await?;
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
        Ok(value)
    }

    async fn set(&self, key: String, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &String) -> Result<(), CacheError> {
        self.inner.delete(key).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.inner.clear().await
    }
}

/// Every operation fails.
pub struct BrokenCache;

#[async_trait]
impl Cache<String, Vec<u8>> for BrokenCache {
    async fn get(&self, _key: &String) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Other("backend down".into()))
    }

    async fn set(&self, _key: String, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<(), CacheError> {
        Err(CacheError::Other("backend down".into()))
    }

    async fn delete(&self, _key: &String) -> Result<(), CacheError> {
        Err(CacheError::Other("backend down".into()))
    }

    async fn clear(&self) -> Result<(), CacheError> {
        Err(CacheError::Other("backend down".into()))
    }
}

pub fn as_byte_cache<C: Cache<String, Vec<u8>> + 'static>(cache: Arc<C>) -> Arc<ByteCache> {
    cache
}
