//! Helix HTTP page fetcher: `GET {base}/{path}?filters&after=cursor`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{Cursor, FetchError, Page, PageFetcher, PageRequest};
use crate::cache::ByteCache;

/// Default Helix API base URL.
pub const DEFAULT_HELIX_URL: &str = "https://api.twitch.tv/helix";

/// Key prefix for page-level response caching: `helix.response.<url>`.
pub const RESPONSE_CACHE_PREFIX: &str = "helix.response.";

/// Lifetime of a cached response when none is given. Listings change, so pages never live forever.
pub const DEFAULT_RESPONSE_TTL: Duration = Duration::from_secs(60);

/// Performs GET requests. Abstraction for testing.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET the URL with the given headers and return the response body.
    async fn get(&self, url: &Url, headers: &[(String, String)]) -> Result<String, FetchError>;
}

/// Reqwest-based HTTP client.
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &Url, headers: &[(String, String)]) -> Result<String, FetchError> {
        let mut req = self.client.get(url.clone());
        for (name, value) in headers {
            req = req.header(name.as_str(), value.as_str());
        }
        let response = req
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(format!("failed to read response: {}", e)))
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Vec<serde_json::Value>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct Pagination {
    #[serde(default)]
    cursor: Option<String>,
}

/// Parses `{"data": [...], "pagination": {"cursor": "..."}}`. An empty or missing cursor
/// means the listing is exhausted.
pub fn parse_page(body: &str) -> Result<Page, FetchError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    let cursor = envelope
        .pagination
        .and_then(|p| p.cursor)
        .filter(|c| !c.is_empty())
        .map(Cursor::from);
    Ok(Page::new(envelope.data, cursor))
}

/// [`PageFetcher`] over the Helix REST API for one resource path (e.g. `clips`).
///
/// Sends `Client-ID` and `Authorization: Bearer` when credentials are set. With a
/// response cache attached, whole pages are cached by URL unless the request sets
/// `ignore_cache`.
pub struct HelixPageFetcher {
    base_url: String,
    path: String,
    client_id: Option<String>,
    oauth_token: Option<String>,
    http_client: Arc<dyn HttpClient>,
    response_cache: Option<Arc<ByteCache>>,
    response_ttl: Duration,
}

impl HelixPageFetcher {
    /// Create with the default base URL and a reqwest client.
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_client(
            DEFAULT_HELIX_URL,
            path,
            Arc::new(ReqwestHttpClient::default()),
        )
    }

    /// Create with a custom base URL and HTTP client.
    pub fn with_client(
        base_url: impl Into<String>,
        path: impl Into<String>,
        http_client: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
            client_id: None,
            oauth_token: None,
            http_client,
            response_cache: None,
            response_ttl: DEFAULT_RESPONSE_TTL,
        }
    }

    pub fn with_credentials(mut self, client_id: Option<String>, oauth_token: Option<String>) -> Self {
        self.client_id = client_id;
        self.oauth_token = oauth_token;
        self
    }

    /// Cache whole response bodies by URL for `ttl`, or [`DEFAULT_RESPONSE_TTL`] when `None`.
    pub fn with_response_cache(mut self, cache: Arc<ByteCache>, ttl: Option<Duration>) -> Self {
        self.response_cache = Some(cache);
        self.response_ttl = ttl.unwrap_or(DEFAULT_RESPONSE_TTL);
        self
    }

    /// Full request URL for `request`; the cursor is sent as `after`.
    pub fn request_url(&self, request: &PageRequest) -> Result<Url, FetchError> {
        let raw = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&raw).map_err(|e| FetchError::Url(format!("{}: {}", raw, e)))?;

        let mut pairs = request.filters.query_pairs();
        if let Some(cursor) = &request.cursor {
            pairs.push(("after", cursor.as_str()));
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if let Some(id) = &self.client_id {
            headers.push(("Client-ID".to_string(), id.clone()));
        }
        if let Some(token) = &self.oauth_token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        headers
    }

    async fn cached_body(&self, key: &String) -> Option<String> {
        let cache = self.response_cache.as_ref()?;
        match cache.get(key).await {
            Ok(Some(bytes)) => String::from_utf8(bytes).ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "response cache read failed");
                None
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HelixPageFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<Page, FetchError> {
        let url = self.request_url(request)?;
        let use_cache = !request.ignore_cache && self.response_cache.is_some();
        let key = format!("{}{}", RESPONSE_CACHE_PREFIX, url);

        if use_cache {
            if let Some(body) = self.cached_body(&key).await {
                if let Ok(page) = parse_page(&body) {
                    tracing::debug!(url = %url, "page served from response cache");
                    return Ok(page);
                }
            }
        }

        tracing::debug!(url = %url, "GET");
        let body = self.http_client.get(&url, &self.headers()).await?;
        let page = parse_page(&body)?;

        if let (true, Some(cache)) = (use_cache, &self.response_cache) {
            if let Err(e) = cache.set(key, body.into_bytes(), Some(self.response_ttl)).await {
                tracing::warn!(url = %url, error = %e, "response cache write failed");
            }
        }
        Ok(page)
    }
}
