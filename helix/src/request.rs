//! Request descriptors: an ID lookup or a paginated query, chosen once at construction.

use std::collections::BTreeSet;

use crate::fetcher::{Cursor, Filters};
use crate::resolver::ResolveError;
use crate::resource::Resource;

/// Filter key carrying identifiers.
pub const ID_FILTER_KEY: &str = "id";

/// A filtered listing request driven by cursor pagination.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub filters: Filters,
    /// Items wanted; `None` uses the resource default.
    pub target_count: Option<usize>,
    /// Resume from this cursor instead of the first page.
    pub cursor: Option<Cursor>,
}

impl QueryRequest {
    pub fn new(filters: Filters) -> Self {
        Self {
            filters,
            target_count: None,
            cursor: None,
        }
    }

    pub fn with_target_count(mut self, target_count: usize) -> Self {
        self.target_count = Some(target_count);
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<Cursor>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

/// Exactly one kind of request.
#[derive(Debug, Clone)]
pub enum RequestDescriptor<Id> {
    /// Look up these identifiers. Set semantics: repeats are already collapsed.
    Ids(BTreeSet<Id>),
    Query(QueryRequest),
}

impl<Id: Ord> RequestDescriptor<Id> {
    pub fn ids(ids: impl IntoIterator<Item = Id>) -> Self {
        RequestDescriptor::Ids(ids.into_iter().collect())
    }

    pub fn query(request: QueryRequest) -> Self {
        RequestDescriptor::Query(request)
    }

    /// Builds a descriptor from loose inputs: positional identifiers plus a filter map
    /// that may itself carry identifiers under `id`.
    ///
    /// Identifiers from both places are merged. Identifiers together with any other
    /// filter are ambiguous and rejected; no identifiers at all yields a query.
    pub fn from_parts<R>(
        ids: impl IntoIterator<Item = Id>,
        mut filters: Filters,
    ) -> Result<Self, ResolveError>
    where
        R: Resource<Id = Id>,
    {
        let mut set: BTreeSet<Id> = ids.into_iter().collect();
        if let Some(value) = filters.remove(ID_FILTER_KEY) {
            for raw in value.values() {
                set.insert(R::parse_id(raw).map_err(ResolveError::Configuration)?);
            }
        }

        if set.is_empty() {
            return Ok(RequestDescriptor::Query(QueryRequest::new(filters)));
        }
        if !filters.is_empty() {
            let keys: Vec<&str> = filters.keys().collect();
            return Err(ResolveError::Configuration(format!(
                "identifiers cannot be combined with query filters ({})",
                keys.join(", ")
            )));
        }
        Ok(RequestDescriptor::Ids(set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ClipId, Clips};

    fn id(v: u64) -> ClipId {
        ClipId::try_from(v).unwrap()
    }

    #[test]
    fn positional_and_filter_ids_merge_and_dedup() {
        let filters = Filters::new().with("id", vec!["5".to_string(), "7".to_string()]);
        let req = RequestDescriptor::from_parts::<Clips>([id(5), id(5)], filters).unwrap();
        match req {
            RequestDescriptor::Ids(ids) => assert_eq!(ids, [id(5), id(7)].into()),
            other => panic!("expected ids, got {:?}", other),
        }
    }

    #[test]
    fn single_string_id_filter_is_accepted() {
        let filters = Filters::new().with("id", "9");
        let req = RequestDescriptor::from_parts::<Clips>([], filters).unwrap();
        assert!(matches!(req, RequestDescriptor::Ids(ids) if ids.len() == 1));
    }

    #[test]
    fn ids_with_other_filters_are_rejected() {
        let filters = Filters::new().with("broadcaster_id", "1");
        let err = RequestDescriptor::from_parts::<Clips>([id(3)], filters).unwrap_err();
        assert!(matches!(err, ResolveError::Configuration(msg) if msg.contains("broadcaster_id")));
    }

    #[test]
    fn invalid_id_text_is_rejected() {
        let filters = Filters::new().with("id", "abc");
        let err = RequestDescriptor::from_parts::<Clips>([], filters).unwrap_err();
        assert!(matches!(err, ResolveError::Configuration(_)));
    }

    #[test]
    fn no_ids_means_query() {
        let filters = Filters::new().with("game_id", "33214");
        let req = RequestDescriptor::from_parts::<Clips>([], filters).unwrap();
        match req {
            RequestDescriptor::Query(q) => {
                assert!(q.filters.contains_key("game_id"));
                assert!(q.target_count.is_none());
                assert!(q.cursor.is_none());
            }
            other => panic!("expected query, got {:?}", other),
        }
    }
}
