use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::LoadError;

/// Resolver settings read from `HELIX_*` environment variables.
///
/// Call after [`crate::load_and_apply`] so `.env` and XDG values are visible.
/// Fields left `None` fall back to the resolver's own defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct HelixSettings {
    pub client_id: Option<String>,
    pub oauth_token: Option<String>,
    pub api_url: Option<String>,
    pub use_cache: bool,
    pub cache_path: Option<PathBuf>,
    pub cache_ttl: Option<Duration>,
    pub id_batch_limit: Option<usize>,
    pub max_concurrent_chunks: Option<usize>,
    pub log_dir: Option<PathBuf>,
}

impl Default for HelixSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            oauth_token: None,
            api_url: None,
            use_cache: true,
            cache_path: None,
            cache_ttl: None,
            id_batch_limit: None,
            max_concurrent_chunks: None,
            log_dir: None,
        }
    }
}

impl HelixSettings {
    pub fn from_env() -> Result<Self, LoadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let use_cache = match get("HELIX_USE_CACHE") {
            Some(v) => parse_bool("HELIX_USE_CACHE", &v)?,
            None => true,
        };
        let cache_ttl = get("HELIX_CACHE_TTL_SECS")
            .map(|v| parse_num::<u64>("HELIX_CACHE_TTL_SECS", &v))
            .transpose()?
            .map(Duration::from_secs);
        let id_batch_limit = get("HELIX_ID_BATCH_LIMIT")
            .map(|v| parse_positive("HELIX_ID_BATCH_LIMIT", &v))
            .transpose()?;
        let max_concurrent_chunks = get("HELIX_MAX_CONCURRENT_CHUNKS")
            .map(|v| parse_positive("HELIX_MAX_CONCURRENT_CHUNKS", &v))
            .transpose()?;

        Ok(Self {
            client_id: get("HELIX_CLIENT_ID"),
            oauth_token: get("HELIX_OAUTH_TOKEN"),
            api_url: get("HELIX_API_URL"),
            use_cache,
            cache_path: get("HELIX_CACHE_PATH").map(PathBuf::from),
            cache_ttl,
            id_batch_limit,
            max_concurrent_chunks,
            log_dir: get("HELIX_LOG_DIR").map(PathBuf::from),
        })
    }
}

fn invalid(key: &str, value: &str, reason: impl Into<String>) -> LoadError {
    LoadError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, LoadError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected a boolean")),
    }
}

fn parse_num<T>(key: &str, value: &str) -> Result<T, LoadError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| invalid(key, value, e.to_string()))
}

fn parse_positive(key: &str, value: &str) -> Result<usize, LoadError> {
    match parse_num::<usize>(key, value)? {
        0 => Err(invalid(key, value, "must be at least 1")),
        n => Ok(n),
    }
}
