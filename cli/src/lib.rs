//! Library side of the `helix` binary: builds a clip resolver from [`HelixSettings`],
//! runs the `clips` and `cache` commands, and renders results as text or JSON.

use std::sync::Arc;

use config::HelixSettings;
use helix::{
    ByteCache, Cache, CacheError, Clip, Clips, Filters, HelixPageFetcher, InMemoryCache,
    PageFetcher, QueryRequest, RequestDescriptor, ResolveError, Resolved, Resolver,
    ResolverOptions, Resource, ReqwestHttpClient, SqliteCache, DEFAULT_HELIX_URL, ID_FILTER_KEY,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config: {0}")]
    Config(#[from] config::LoadError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("cache: {0}")]
    Cache(#[from] CacheError),
    #[error("output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Filters accepted by `helix clips query`.
#[derive(Debug, Clone, Default)]
pub struct ClipQuery {
    pub broadcaster_id: Option<String>,
    pub game_id: Option<String>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub first: Option<usize>,
    pub after: Option<String>,
}

impl ClipQuery {
    pub fn into_request(self) -> QueryRequest {
        let mut filters = Filters::new();
        let pairs = [
            ("broadcaster_id", self.broadcaster_id),
            ("game_id", self.game_id),
            ("started_at", self.started_at),
            ("ended_at", self.ended_at),
        ];
        for (key, value) in pairs {
            if let Some(v) = value {
                filters.insert(key, v);
            }
        }
        let mut request = QueryRequest::new(filters);
        if let Some(n) = self.first {
            request = request.with_target_count(n);
        }
        if let Some(cursor) = self.after {
            request = request.with_cursor(cursor);
        }
        request
    }
}

/// SQLite when `cache_path` is set, in-memory otherwise, nothing when caching is off.
pub fn build_cache(settings: &HelixSettings) -> Result<Option<Arc<ByteCache>>, CliError> {
    if !settings.use_cache {
        return Ok(None);
    }
    let cache: Arc<ByteCache> = match &settings.cache_path {
        Some(path) => Arc::new(SqliteCache::new(path)?),
        None => Arc::new(InMemoryCache::<String, Vec<u8>>::new()),
    };
    Ok(Some(cache))
}

pub fn build_resolver(
    settings: &HelixSettings,
    cache: Option<Arc<ByteCache>>,
) -> Result<Resolver<Clips>, CliError> {
    let base_url = settings
        .api_url
        .clone()
        .unwrap_or_else(|| DEFAULT_HELIX_URL.to_string());
    let mut fetcher = HelixPageFetcher::with_client(
        base_url,
        Clips::PATH,
        Arc::new(ReqwestHttpClient::default()),
    )
    .with_credentials(settings.client_id.clone(), settings.oauth_token.clone());
    if let Some(cache) = &cache {
        fetcher = fetcher.with_response_cache(Arc::clone(cache), settings.cache_ttl);
    }
    let fetcher: Arc<dyn PageFetcher> = Arc::new(fetcher);

    let mut options = ResolverOptions::for_resource::<Clips>()
        .with_use_cache(settings.use_cache)
        .with_cache_ttl(settings.cache_ttl);
    if let Some(n) = settings.id_batch_limit {
        options = options.with_id_batch_limit(n);
    }
    if let Some(n) = settings.max_concurrent_chunks {
        options = options.with_max_concurrent_chunks(n);
    }

    Ok(Resolver::new(fetcher, cache, options)?)
}

/// Resolves clips given as raw identifier strings.
pub async fn run_ids(
    resolver: &Resolver<Clips>,
    raw_ids: Vec<String>,
    cancel: &CancellationToken,
) -> Result<Resolved<Clip>, CliError> {
    let filters = Filters::new().with(ID_FILTER_KEY, raw_ids);
    let request = RequestDescriptor::from_parts::<Clips>(std::iter::empty(), filters)?;
    Ok(resolver.resolve(request, cancel).await?)
}

pub async fn run_query(
    resolver: &Resolver<Clips>,
    query: ClipQuery,
    cancel: &CancellationToken,
) -> Result<Resolved<Clip>, CliError> {
    Ok(resolver.resolve_by_query(query.into_request(), cancel).await?)
}

/// Empties the cache. Returns false when there is no cache to clear.
pub async fn clear_cache(cache: Option<&ByteCache>) -> Result<bool, CliError> {
    match cache {
        Some(cache) => {
            cache.clear().await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json { pretty: bool },
}

/// Renders items for stdout. Warnings appear only in JSON; text mode leaves them to stderr.
pub fn render(resolved: &Resolved<Clip>, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for clip in &resolved.items {
                out.push_str(&format!("{}\t{}\n", clip.id, clip));
            }
            if let Some(cursor) = &resolved.next_cursor {
                out.push_str(&format!("next cursor: {}\n", cursor));
            }
            Ok(out)
        }
        OutputFormat::Json { pretty } => {
            let value = serde_json::json!({
                "items": resolved.items,
                "warnings": resolved.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
                "next_cursor": resolved.next_cursor.as_ref().map(|c| c.as_str()),
            });
            let s = if pretty {
                serde_json::to_string_pretty(&value)?
            } else {
                serde_json::to_string(&value)?
            };
            Ok(format!("{}\n", s))
        }
    }
}
