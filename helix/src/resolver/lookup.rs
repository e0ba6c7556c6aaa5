//! Cache-backed lookup: split identifiers into cache hits and misses.

use std::collections::BTreeSet;

use tokio_util::sync::CancellationToken;

use super::{ResolveError, ResolveWarning};
use crate::cache::{cache_key, ByteCache};
use crate::resource::Resource;

/// Outcome of [`lookup`]: items decoded from cache and identifiers still to fetch.
pub struct CacheLookup<R: Resource> {
    pub resolved: Vec<R::Item>,
    pub unresolved: BTreeSet<R::Id>,
    pub warnings: Vec<ResolveWarning>,
}

/// Reads each identifier's entry from `cache`. Never writes.
///
/// Read failures and undecodable entries count as misses and are reported as warnings.
pub async fn lookup<R: Resource>(
    cache: &ByteCache,
    ids: &BTreeSet<R::Id>,
    cancel: &CancellationToken,
) -> Result<CacheLookup<R>, ResolveError> {
    let mut out = CacheLookup::<R> {
        resolved: Vec::new(),
        unresolved: BTreeSet::new(),
        warnings: Vec::new(),
    };

    for id in ids {
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        let key = cache_key(R::NAMESPACE, id);
        let failure = match cache.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<R::Item>(&bytes) {
                Ok(item) => {
                    out.resolved.push(item);
                    continue;
                }
                Err(e) => Some(format!("unreadable entry: {}", e)),
            },
            Ok(None) => None,
            Err(e) => Some(e.to_string()),
        };
        if let Some(message) = failure {
            tracing::warn!(key = %key, error = %message, "cache read failed; treating as miss");
            out.warnings.push(ResolveWarning::Cache { key, message });
        }
        out.unresolved.insert(id.clone());
    }
    Ok(out)
}
