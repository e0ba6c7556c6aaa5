//! # Helix
//!
//! Client-side resource fetching for a paginated, rate-limited REST API. Callers ask for
//! a collection either by identifiers or by a scoped query; the [`Resolver`] turns that
//! into as few remote calls as the API allows and keeps a cache warm for next time.
//!
//! ## Design principles
//!
//! - **Cache first**: identifiers already cached are never fetched again. Cache failures
//!   degrade to misses and are reported as [`ResolveWarning`]s, never as errors.
//! - **API-legal batches**: identifier lookups are chunked by the [`BatchPlanner`] to the
//!   resource's `ID_API_LIMIT`.
//! - **Bounded pagination**: queries follow cursors until the target count is met, the
//!   listing is exhausted, or an empty page comes back.
//! - **Injected collaborators**: the cache ([`Cache`]) and the transport ([`PageFetcher`])
//!   are passed in at construction; there is no process-wide state.
//! - **Explicit request kinds**: a [`RequestDescriptor`] is either `Ids` or `Query`;
//!   ambiguous inputs are rejected with [`ResolveError::Configuration`].
//!
//! ## Main modules
//!
//! - [`cache`]: [`Cache`] port, [`InMemoryCache`], [`SqliteCache`], [`cache_key`].
//! - [`fetcher`]: [`PageFetcher`] port, [`Page`], [`Cursor`], [`Filters`]; HTTP adapter
//!   [`HelixPageFetcher`].
//! - [`planner`]: [`BatchPlanner`], [`BatchPlan`].
//! - [`request`]: [`RequestDescriptor`], [`QueryRequest`].
//! - [`resource`]: [`Resource`] trait; [`Clips`], [`Clip`], [`ClipId`].
//! - [`resolver`]: [`Resolver`], [`ResolverOptions`], [`Resolved`], [`ResolveError`],
//!   cache [`lookup`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use helix::{
//!     ByteCache, Clips, HelixPageFetcher, InMemoryCache, Resolver, ResolverOptions, Resource,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HelixPageFetcher::new(Clips::PATH)
//!     .with_credentials(Some("client-id".into()), Some("token".into()));
//! let cache: Arc<ByteCache> = Arc::new(InMemoryCache::<String, Vec<u8>>::new());
//! let resolver: Resolver<Clips> = Resolver::new(
//!     Arc::new(fetcher),
//!     Some(cache),
//!     ResolverOptions::for_resource::<Clips>(),
//! )?;
//!
//! let ids = ["1".parse()?, "2".parse()?];
//! let clips = resolver.resolve_by_ids(ids, &CancellationToken::new()).await?;
//! for clip in &clips.items {
//!     println!("{}", clip);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod fetcher;
pub mod planner;
pub mod request;
pub mod resolver;
pub mod resource;

pub use cache::{cache_key, ByteCache, Cache, CacheError, InMemoryCache, SqliteCache};
pub use fetcher::{
    Cursor, FetchError, FilterValue, Filters, HelixPageFetcher, HttpClient, Page, PageFetcher,
    PageRequest, ReqwestHttpClient, DEFAULT_HELIX_URL, DEFAULT_RESPONSE_TTL,
};
pub use planner::{BatchPlan, BatchPlanner};
pub use request::{QueryRequest, RequestDescriptor, ID_FILTER_KEY};
pub use resolver::{
    lookup, CacheLookup, ResolveError, ResolveWarning, Resolved, Resolver, ResolverOptions,
    FIRST_FILTER_KEY,
};
pub use resource::{Clip, ClipId, Clips, ParseIdError, Resource};
