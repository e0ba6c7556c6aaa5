//! Resolver: cache-first batched ID lookup and cursor-driven pagination.
//!
//! Composes the cache port ([`ByteCache`]), the page fetcher ([`PageFetcher`]) and the
//! [`BatchPlanner`] for one [`Resource`].
//!
//! - **ID requests**: cache hits short-circuit; misses are chunked to
//!   `id_batch_limit`, fetched with response caching bypassed, and each returned item is
//!   written back under `"<namespace>.<id>"`. A short chunk drops the missing identifiers
//!   and records [`ResolveWarning::Shortfall`].
//! - **Query requests**: exactly one scoping key must be present. Pages are fetched until
//!   the target count is reached, the cursor runs out, or a page comes back empty.
//!
//! Cache failures never fail a resolution; transport and decode failures always do.

mod error;
mod lookup;

pub use error::{ResolveError, ResolveWarning};
pub use lookup::{lookup, CacheLookup};

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::cache::{cache_key, ByteCache};
use crate::fetcher::{Cursor, Filters, Page, PageFetcher, PageRequest};
use crate::planner::BatchPlanner;
use crate::request::{QueryRequest, RequestDescriptor, ID_FILTER_KEY};
use crate::resource::Resource;

/// Page-size filter key sent with query pages.
pub const FIRST_FILTER_KEY: &str = "first";

/// Tunables for one [`Resolver`].
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Consult and warm the cache. Ignored when no cache is injected.
    pub use_cache: bool,
    /// Identifiers per lookup call.
    pub id_batch_limit: usize,
    /// Upper bound for the `first` page-size hint.
    pub page_size_limit: usize,
    /// TTL for item entries written to the cache.
    pub cache_ttl: Option<Duration>,
    /// ID chunks fetched concurrently; 1 fetches sequentially.
    pub max_concurrent_chunks: usize,
}

impl ResolverOptions {
    /// Defaults from the resource's API limits.
    pub fn for_resource<R: Resource>() -> Self {
        Self {
            use_cache: true,
            id_batch_limit: R::ID_API_LIMIT,
            page_size_limit: R::FIRST_API_LIMIT,
            cache_ttl: None,
            max_concurrent_chunks: 1,
        }
    }

    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_id_batch_limit(mut self, limit: usize) -> Self {
        self.id_batch_limit = limit;
        self
    }

    pub fn with_page_size_limit(mut self, limit: usize) -> Self {
        self.page_size_limit = limit;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_max_concurrent_chunks(mut self, n: usize) -> Self {
        self.max_concurrent_chunks = n;
        self
    }
}

/// Materialized items plus any soft failures met on the way.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    /// Order is not significant.
    pub items: Vec<T>,
    pub warnings: Vec<ResolveWarning>,
    /// Cursor to continue a query from; `None` when exhausted or for ID requests.
    pub next_cursor: Option<Cursor>,
}

impl<T> Default for Resolved<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            warnings: Vec::new(),
            next_cursor: None,
        }
    }
}

impl<T> Resolved<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Resolves [`RequestDescriptor`]s for resource `R`.
///
/// The cache is injected, never global; pass `None` to run without one.
pub struct Resolver<R: Resource> {
    fetcher: Arc<dyn PageFetcher>,
    cache: Option<Arc<ByteCache>>,
    options: ResolverOptions,
    planner: BatchPlanner,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Resolver<R> {
    /// Validates `options`; zero limits or zero concurrency are configuration errors.
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        cache: Option<Arc<ByteCache>>,
        options: ResolverOptions,
    ) -> Result<Self, ResolveError> {
        let planner = BatchPlanner::new(options.id_batch_limit)?;
        if options.page_size_limit == 0 {
            return Err(ResolveError::Configuration(
                "page size limit must be at least 1".to_string(),
            ));
        }
        if options.max_concurrent_chunks == 0 {
            return Err(ResolveError::Configuration(
                "max concurrent chunks must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            fetcher,
            cache,
            options,
            planner,
            _resource: PhantomData,
        })
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    fn caching(&self) -> Option<&ByteCache> {
        if self.options.use_cache {
            self.cache.as_deref()
        } else {
            None
        }
    }

    /// Dispatches on the request kind.
    pub async fn resolve(
        &self,
        request: RequestDescriptor<R::Id>,
        cancel: &CancellationToken,
    ) -> Result<Resolved<R::Item>, ResolveError> {
        match request {
            RequestDescriptor::Ids(ids) => self.resolve_id_set(ids, cancel).await,
            RequestDescriptor::Query(query) => self.resolve_by_query(query, cancel).await,
        }
    }

    /// Resolves every identifier from cache or remote. Duplicates are collapsed first;
    /// identifiers the remote does not return are dropped with a warning.
    pub async fn resolve_by_ids(
        &self,
        ids: impl IntoIterator<Item = R::Id>,
        cancel: &CancellationToken,
    ) -> Result<Resolved<R::Item>, ResolveError> {
        let ids: BTreeSet<R::Id> = ids.into_iter().collect();
        self.resolve_id_set(ids, cancel).await
    }

    /// Pages through a scoped listing until `target_count` items are collected or the
    /// listing ends. The result may be shorter than the target and is never padded.
    pub async fn resolve_by_query(
        &self,
        request: QueryRequest,
        cancel: &CancellationToken,
    ) -> Result<Resolved<R::Item>, ResolveError> {
        let target = request.target_count.unwrap_or(R::DEFAULT_FIRST);
        check_query::<R>(&request.filters, target)?;

        let span = tracing::debug_span!("resolve_by_query", resource = R::PATH, target);
        async move {
            let mut resolved = Resolved::default();
            let mut cursor = request.cursor;
            loop {
                let wanted = (target - resolved.items.len()).min(self.options.page_size_limit);
                let mut filters = request.filters.clone();
                filters.insert(FIRST_FILTER_KEY, wanted.to_string());
                let page_request = PageRequest {
                    filters,
                    cursor: cursor.take(),
                    ignore_cache: false,
                };

                let page = self.fetch_page(&page_request, cancel).await?;
                cursor = page.cursor;
                if page.data.is_empty() {
                    tracing::debug!("empty page; stopping");
                    break;
                }

                let items = decode_page::<R>(page.data)?;
                resolved.warnings.extend(self.store_items(&items, cancel).await?);
                resolved.items.extend(items);
                tracing::debug!(collected = resolved.items.len(), more = cursor.is_some(), "page fetched");

                if resolved.items.len() >= target || cursor.is_none() {
                    break;
                }
            }
            resolved.next_cursor = cursor;
            Ok(resolved)
        }
        .instrument(span)
        .await
    }

    async fn resolve_id_set(
        &self,
        ids: BTreeSet<R::Id>,
        cancel: &CancellationToken,
    ) -> Result<Resolved<R::Item>, ResolveError> {
        let span = tracing::debug_span!("resolve_by_ids", resource = R::PATH, requested = ids.len());
        async move {
            let mut resolved = Resolved::default();
            if ids.is_empty() {
                return Ok(resolved);
            }

            let remaining = match self.caching() {
                Some(cache) => {
                    let hits = lookup::<R>(cache, &ids, cancel).await?;
                    tracing::debug!(
                        hits = hits.resolved.len(),
                        misses = hits.unresolved.len(),
                        "cache lookup"
                    );
                    resolved.items.extend(hits.resolved);
                    resolved.warnings.extend(hits.warnings);
                    hits.unresolved
                }
                None => ids,
            };
            if remaining.is_empty() {
                return Ok(resolved);
            }

            let plan = self.planner.plan(remaining);
            tracing::debug!(
                identifiers = plan.remaining(),
                chunks = plan.chunk_count(),
                "fetching uncached identifiers"
            );
            let mut chunks = stream::iter(plan)
                .map(|chunk| self.fetch_chunk(chunk, cancel))
                .buffered(self.options.max_concurrent_chunks);
            while let Some(outcome) = chunks.next().await {
                let outcome = outcome?;
                resolved.items.extend(outcome.items);
                resolved.warnings.extend(outcome.warnings);
            }
            Ok(resolved)
        }
        .instrument(span)
        .await
    }

    /// One lookup call for one chunk. The chunk counts as done whatever comes back.
    async fn fetch_chunk(
        &self,
        chunk: Vec<R::Id>,
        cancel: &CancellationToken,
    ) -> Result<Resolved<R::Item>, ResolveError> {
        let requested = chunk.len();
        let span = tracing::debug_span!("fetch_chunk", size = requested);
        async move {
            let ids: Vec<String> = chunk.iter().map(ToString::to_string).collect();
            let request = PageRequest {
                filters: Filters::new().with(ID_FILTER_KEY, ids),
                cursor: None,
                ignore_cache: true,
            };

            let page = self.fetch_page(&request, cancel).await?;
            let items = decode_page::<R>(page.data)?;

            // Compared by identity: an unrequested or repeated record does not cover a gap.
            let returned: BTreeSet<R::Id> = items.iter().filter_map(R::id_of).collect();
            let missing: Vec<String> = chunk
                .iter()
                .filter(|id| !returned.contains(*id))
                .map(ToString::to_string)
                .collect();

            let mut out = Resolved::default();
            if !missing.is_empty() {
                let returned = requested - missing.len();
                tracing::warn!(
                    requested,
                    returned,
                    missing = ?missing,
                    "lookup came back short; dropping missing identifiers"
                );
                out.warnings.push(ResolveWarning::Shortfall {
                    requested,
                    returned,
                    missing,
                });
            } else {
                tracing::debug!(requested, "chunk resolved");
            }
            out.warnings.extend(self.store_items(&items, cancel).await?);
            out.items = items;
            Ok(out)
        }
        .instrument(span)
        .await
    }

    async fn fetch_page(
        &self,
        request: &PageRequest,
        cancel: &CancellationToken,
    ) -> Result<Page, ResolveError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ResolveError::Cancelled),
            page = self.fetcher.fetch(request) => Ok(page?),
        }
    }

    /// Writes each item under its own key. Failures become warnings.
    async fn store_items(
        &self,
        items: &[R::Item],
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolveWarning>, ResolveError> {
        let Some(cache) = self.caching() else {
            return Ok(Vec::new());
        };
        let mut warnings = Vec::new();
        for item in items {
            if cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }
            let Some(id) = R::id_of(item) else {
                continue;
            };
            let key = cache_key(R::NAMESPACE, &id);
            let result = match serde_json::to_vec(item) {
                Ok(value) => cache
                    .set(key.clone(), value, self.options.cache_ttl)
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            if let Err(message) = result {
                tracing::warn!(key = %key, error = %message, "cache write failed");
                warnings.push(ResolveWarning::Cache { key, message });
            }
        }
        Ok(warnings)
    }
}

fn check_query<R: Resource>(filters: &Filters, target: usize) -> Result<(), ResolveError> {
    if target == 0 {
        return Err(ResolveError::Configuration(
            "target count must be at least 1".to_string(),
        ));
    }
    if filters.contains_key(ID_FILTER_KEY) {
        return Err(ResolveError::Configuration(
            "query filters cannot carry identifiers; use an ID request".to_string(),
        ));
    }
    let present = R::SCOPING_KEYS
        .iter()
        .filter(|k| filters.contains_key(k))
        .count();
    if present != 1 {
        return Err(ResolveError::Precondition(format!(
            "exactly one of [{}] is required to paginate, found {}",
            R::SCOPING_KEYS.join(", "),
            present
        )));
    }
    Ok(())
}

fn decode_page<R: Resource>(data: Vec<serde_json::Value>) -> Result<Vec<R::Item>, ResolveError> {
    data.into_iter()
        .map(|raw| R::decode(raw).map_err(|e| ResolveError::Decode(e.to_string())))
        .collect()
}
