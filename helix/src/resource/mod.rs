//! Remote resource descriptions: identifier type, item type, cache namespace, API limits.
//!
//! The resolver is generic over [`Resource`]; [`Clips`] is the resource shipped here.

mod clip;

pub use clip::{Clip, ClipId, Clips, ParseIdError};

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Static description of one paginated, ID-addressable API resource.
pub trait Resource: Send + Sync + 'static {
    /// Identifier naming one remote item. Ordered so batch plans are stable.
    type Id: Clone + Ord + fmt::Display + fmt::Debug + Send + Sync + 'static;
    /// Decoded record. Serialized with serde_json when cached.
    type Item: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Cache key prefix; item keys are `"<NAMESPACE>.<id>"`.
    const NAMESPACE: &'static str;
    /// Path under the API base URL.
    const PATH: &'static str;
    /// Maximum identifiers per `id` lookup.
    const ID_API_LIMIT: usize = 100;
    /// Maximum page size (`first`).
    const FIRST_API_LIMIT: usize = 100;
    /// Default target count for query requests.
    const DEFAULT_FIRST: usize = 20;
    /// Filter keys that scope a paginated listing; exactly one must be present.
    const SCOPING_KEYS: &'static [&'static str];

    /// Parses an identifier given as text (CLI args, `id` filter values).
    fn parse_id(raw: &str) -> Result<Self::Id, String>;

    /// Identifier of a decoded item, if it carries a valid one.
    fn id_of(item: &Self::Item) -> Option<Self::Id>;

    /// Decodes one raw record from a page.
    fn decode(raw: serde_json::Value) -> Result<Self::Item, serde_json::Error> {
        serde_json::from_value(raw)
    }
}
