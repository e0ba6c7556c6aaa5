//! Page fetcher port: one remote call in, one decoded-ready page out.
//!
//! The resolver only sees [`PageFetcher`]; [`HelixPageFetcher`] is the HTTP adapter.

mod http;

pub use http::{
    parse_page, HelixPageFetcher, HttpClient, ReqwestHttpClient, DEFAULT_HELIX_URL,
    DEFAULT_RESPONSE_TTL, RESPONSE_CACHE_PREFIX,
};

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a single page fetch. Propagated to the caller as-is; no retry here.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or I/O failure.
    #[error("request failed: {0}")]
    Transport(String),
    /// Remote answered with a non-success status.
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
    /// Body was not a valid page envelope.
    #[error("invalid response: {0}")]
    Parse(String),
    #[error("invalid url: {0}")]
    Url(String),
}

/// Opaque pagination continuation token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Cursor {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A filter value: a single string or a list (sent as a repeated query key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

impl FilterValue {
    /// All values, one entry for `One`.
    pub fn values(&self) -> Vec<&str> {
        match self {
            FilterValue::One(v) => vec![v.as_str()],
            FilterValue::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::One(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::One(s)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(v: Vec<String>) -> Self {
        FilterValue::Many(v)
    }
}

/// Query filters keyed by API parameter name. Ordered so request URLs are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(BTreeMap<String, FilterValue>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flattens to `(key, value)` pairs; list values repeat the key.
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        self.0
            .iter()
            .flat_map(|(k, v)| v.values().into_iter().map(move |v| (k.as_str(), v)))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Filters
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Filters::new();
        for (k, v) in iter {
            filters.insert(k, v);
        }
        filters
    }
}

/// One page request: filters, optional cursor, and whether response caching is bypassed.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub filters: Filters,
    pub cursor: Option<Cursor>,
    /// Skip any page-level response cache for this call.
    pub ignore_cache: bool,
}

/// One page of raw records plus the cursor for the next page (`None` = exhausted).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub data: Vec<serde_json::Value>,
    pub cursor: Option<Cursor>,
}

impl Page {
    pub fn new(data: Vec<serde_json::Value>, cursor: Option<Cursor>) -> Self {
        Self { data, cursor }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Performs one remote call per [`PageRequest`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: &PageRequest) -> Result<Page, FetchError>;
}
