//! Cache-related errors.

use thiserror::Error;

/// Errors that can occur when working with caches.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Backing storage failed (open, query, lock).
    #[error("cache storage: {0}")]
    Storage(String),
    /// General cache error.
    #[error("Cache error: {0}")]
    Other(String),
}

impl From<rusqlite::Error> for CacheError {
    fn from(e: rusqlite::Error) -> Self {
        CacheError::Storage(e.to_string())
    }
}
