//! Resolver error taxonomy and non-fatal warnings.

use std::fmt;

use thiserror::Error;

use crate::fetcher::FetchError;

/// Hard failures. Configuration and precondition errors are raised before any remote work.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Invalid limits or an ambiguous/malformed request.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A query cannot be paginated as given.
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("transport error: {0}")]
    Transport(#[from] FetchError),
    /// A fetched record could not be decoded into an item.
    #[error("decode error: {0}")]
    Decode(String),
    #[error("resolution cancelled")]
    Cancelled,
}

/// Soft failures surfaced alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    /// An ID chunk came back short; the missing identifiers were dropped.
    Shortfall {
        requested: usize,
        returned: usize,
        missing: Vec<String>,
    },
    /// A cache read or write failed, or a cached entry was unreadable.
    Cache { key: String, message: String },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveWarning::Shortfall {
                requested,
                returned,
                missing,
            } => write!(
                f,
                "requested {} identifiers, got {}; dropped [{}]",
                requested,
                returned,
                missing.join(", ")
            ),
            ResolveWarning::Cache { key, message } => write!(f, "cache {}: {}", key, message),
        }
    }
}
