//! Query-request path: cursor pagination, stop conditions, scoping precondition.

mod common;

use std::sync::Arc;

use common::{as_byte_cache, id, page_of, CountingCache, MockFetcher};
use helix::{
    Clips, Cursor, FilterValue, Filters, Page, QueryRequest, RequestDescriptor, ResolveError,
    Resolver, ResolverOptions,
};
use tokio_util::sync::CancellationToken;

fn resolver(fetcher: Arc<MockFetcher>) -> Resolver<Clips> {
    Resolver::new(fetcher, None, ResolverOptions::for_resource::<Clips>()).unwrap()
}

fn by_broadcaster() -> Filters {
    Filters::new().with("broadcaster_id", "1001")
}

fn first_hint(filters: &Filters) -> Option<&str> {
    match filters.get("first") {
        Some(FilterValue::One(v)) => Some(v.as_str()),
        _ => None,
    }
}

#[tokio::test]
async fn stops_once_the_target_count_is_reached() {
    let fetcher = Arc::new(MockFetcher::pages(vec![
        page_of(1, 20, Some("A")),
        page_of(21, 20, Some("B")),
        page_of(41, 20, Some("B")),
        page_of(61, 20, None),
    ]));
    let resolver = resolver(fetcher.clone());

    let out = resolver
        .resolve_by_query(
            QueryRequest::new(by_broadcaster()).with_target_count(50),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(fetcher.calls(), 3);
    assert_eq!(out.len(), 60);
    assert_eq!(out.next_cursor, Some(Cursor::from("B")));

    let cursors: Vec<Option<Cursor>> = fetcher.requests().into_iter().map(|r| r.cursor).collect();
    assert_eq!(
        cursors,
        vec![None, Some(Cursor::from("A")), Some(Cursor::from("B"))]
    );
}

#[tokio::test]
async fn stops_when_the_cursor_runs_out() {
    let fetcher = Arc::new(MockFetcher::pages(vec![
        page_of(1, 20, Some("A")),
        page_of(21, 5, None),
    ]));
    let resolver = resolver(fetcher.clone());

    let out = resolver
        .resolve_by_query(
            QueryRequest::new(by_broadcaster()).with_target_count(100),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(fetcher.calls(), 2);
    assert_eq!(out.len(), 25);
    assert!(out.next_cursor.is_none());
}

#[tokio::test]
async fn stops_on_an_empty_page_even_with_a_cursor() {
    let fetcher = Arc::new(MockFetcher::pages(vec![
        page_of(1, 20, Some("A")),
        Page::new(Vec::new(), Some(Cursor::from("A"))),
        page_of(21, 20, Some("B")),
    ]));
    let resolver = resolver(fetcher.clone());

    let out = resolver
        .resolve_by_query(
            QueryRequest::new(by_broadcaster()).with_target_count(100),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(fetcher.calls(), 2);
    assert_eq!(out.len(), 20);
}

#[tokio::test]
async fn default_target_is_one_page_of_twenty() {
    let fetcher = Arc::new(MockFetcher::pages(vec![
        page_of(1, 20, Some("A")),
        page_of(21, 20, Some("B")),
    ]));
    let resolver = resolver(fetcher.clone());

    let out = resolver
        .resolve_by_query(QueryRequest::new(by_broadcaster()), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(out.len(), 20);
    assert_eq!(first_hint(&fetcher.requests()[0].filters), Some("20"));
}

#[tokio::test]
async fn page_size_hint_shrinks_toward_the_target() {
    let fetcher = Arc::new(MockFetcher::pages(vec![
        page_of(1, 20, Some("A")),
        page_of(21, 10, Some("B")),
    ]));
    let resolver: Resolver<Clips> = Resolver::new(
        fetcher.clone(),
        None,
        ResolverOptions::for_resource::<Clips>().with_page_size_limit(20),
    )
    .unwrap();

    let out = resolver
        .resolve_by_query(
            QueryRequest::new(by_broadcaster()).with_target_count(30),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(out.len(), 30);
    let hints: Vec<Option<String>> = fetcher
        .requests()
        .iter()
        .map(|r| first_hint(&r.filters).map(String::from))
        .collect();
    assert_eq!(hints, vec![Some("20".to_string()), Some("10".to_string())]);
}

#[tokio::test]
async fn resumes_from_a_given_cursor_and_allows_page_caching() {
    let fetcher = Arc::new(MockFetcher::pages(vec![page_of(41, 20, None)]));
    let resolver = resolver(fetcher.clone());

    resolver
        .resolve_by_query(
            QueryRequest::new(by_broadcaster()).with_cursor("B"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let requests = fetcher.requests();
    let request = &requests[0];
    assert_eq!(request.cursor, Some(Cursor::from("B")));
    assert!(!request.ignore_cache);
}

#[tokio::test]
async fn queried_items_are_reusable_by_id() {
    let fetcher = Arc::new(MockFetcher::pages(vec![page_of(1, 3, None)]));
    let cache = CountingCache::new();
    let resolver: Resolver<Clips> = Resolver::new(
        fetcher.clone(),
        Some(as_byte_cache(cache.clone())),
        ResolverOptions::for_resource::<Clips>(),
    )
    .unwrap();
    let token = CancellationToken::new();

    resolver
        .resolve_by_query(QueryRequest::new(by_broadcaster()), &token)
        .await
        .unwrap();
    assert_eq!(fetcher.calls(), 1);

    let out = resolver
        .resolve_by_ids([id(1), id(2), id(3)], &token)
        .await
        .unwrap();
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(out.len(), 3);
}

#[tokio::test]
async fn missing_or_ambiguous_scope_fails_before_fetching() {
    let fetcher = Arc::new(MockFetcher::pages(vec![page_of(1, 20, None)]));
    let resolver = resolver(fetcher.clone());
    let token = CancellationToken::new();

    let none = resolver
        .resolve_by_query(QueryRequest::new(Filters::new()), &token)
        .await
        .unwrap_err();
    assert!(matches!(none, ResolveError::Precondition(_)));

    let both = Filters::new()
        .with("broadcaster_id", "1001")
        .with("game_id", "33214");
    let both = resolver
        .resolve_by_query(QueryRequest::new(both), &token)
        .await
        .unwrap_err();
    assert!(matches!(both, ResolveError::Precondition(_)));

    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn invalid_query_shapes_are_configuration_errors() {
    let fetcher = Arc::new(MockFetcher::pages(Vec::new()));
    let resolver = resolver(fetcher.clone());
    let token = CancellationToken::new();

    let zero = resolver
        .resolve_by_query(QueryRequest::new(by_broadcaster()).with_target_count(0), &token)
        .await
        .unwrap_err();
    assert!(matches!(zero, ResolveError::Configuration(_)));

    let with_ids = resolver
        .resolve_by_query(QueryRequest::new(by_broadcaster().with("id", "5")), &token)
        .await
        .unwrap_err();
    assert!(matches!(with_ids, ResolveError::Configuration(_)));

    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn undecodable_record_is_a_decode_error() {
    let fetcher = Arc::new(MockFetcher::pages(vec![Page::new(
        vec![serde_json::json!({ "title": "no id" })],
        None,
    )]));
    let resolver = resolver(fetcher);

    let err = resolver
        .resolve_by_query(QueryRequest::new(by_broadcaster()), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Decode(_)));
}

#[tokio::test]
async fn descriptor_without_ids_dispatches_to_query_path() {
    let fetcher = Arc::new(MockFetcher::pages(vec![page_of(1, 5, None)]));
    let resolver = resolver(fetcher.clone());
    let request = RequestDescriptor::from_parts::<Clips>([], Filters::new().with("game_id", "33214"))
        .unwrap();

    let out = resolver
        .resolve(request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(out.len(), 5);
    assert!(fetcher.requests()[0].filters.contains_key("game_id"));
}
