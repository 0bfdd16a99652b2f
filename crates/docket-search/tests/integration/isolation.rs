//! Test-run wrapper: gating, fixtures, and temporary index directories.

#![cfg(feature = "fts-tantivy")]

use std::sync::Arc;
use std::sync::mpsc;

use docket_core::Error;
use docket_search::{
    BackendRegistry, SearchBackend, SearchQuery, SearchTestContext, TestSearchBackend,
};

use crate::common::{TestHarness, document};

fn wrapper(harness: &TestHarness, context: Arc<SearchTestContext>) -> TestSearchBackend {
    TestSearchBackend::from_settings(
        &harness.tantivy_settings(),
        &BackendRegistry::with_defaults(),
        Arc::clone(&harness.models),
        context,
    )
    .unwrap()
}

#[tokio::test]
async fn test_configured_index_path_is_never_touched() {
    let harness = TestHarness::new();
    let context = Arc::new(SearchTestContext::new());
    context.activate();

    let backend = wrapper(&harness, context);
    backend
        .index_instance(&document("1", "invoice"))
        .await
        .unwrap();

    assert!(!harness.index_path().exists());
    assert!(backend.index_path().unwrap().join("document").is_dir());
}

#[tokio::test]
async fn test_parallel_wrappers_do_not_share_state() {
    let harness = TestHarness::new();
    let context = Arc::new(SearchTestContext::new());
    context.activate();

    let first = wrapper(&harness, context.clone());
    let second = wrapper(&harness, context);
    assert_ne!(first.index_path(), second.index_path());

    first
        .index_instance(&document("1", "invoice"))
        .await
        .unwrap();

    let seen_by_second = second
        .search(&SearchQuery::for_type("document", "invoice"))
        .await
        .unwrap();
    assert!(seen_by_second.is_empty());
    assert_eq!(first.document_count("document").await.unwrap(), 1);
}

#[tokio::test]
async fn test_fixture_round_trip() {
    let harness = TestHarness::new();
    let context = Arc::new(SearchTestContext::new());
    let backend = wrapper(&harness, context.clone());

    // Non-search test: writes are dropped
    backend
        .index_instance(&document("9", "contract renewal"))
        .await
        .unwrap();
    assert_eq!(backend.document_count("document").await.unwrap(), 0);

    context.activate();
    context.bind("test_document", Arc::new(document("42", "invoice march")));
    context.set_fixture_object_name("test_document");

    let results = backend
        .search(&SearchQuery::for_type("document", "invoice"))
        .await
        .unwrap();
    assert_eq!(results.ids(), vec![("document", "42")]);

    // Re-indexing the fixture on every search is idempotent
    backend
        .search(&SearchQuery::for_type("document", "march"))
        .await
        .unwrap();
    assert_eq!(backend.document_count("document").await.unwrap(), 1);
}

#[tokio::test]
async fn test_unbound_fixture_surfaces() {
    let harness = TestHarness::new();
    let context = Arc::new(SearchTestContext::new());
    context.activate();
    context.set_fixture_object_name("test_cabinet");

    let backend = wrapper(&harness, context);
    let err = backend
        .search(&SearchQuery::for_type("document", "invoice"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FixtureNotBound(name) if name == "test_cabinet"));
}

#[test]
fn test_temporary_directory_removed_when_test_panics() {
    let harness = TestHarness::new();
    let settings = harness.tantivy_settings();
    let models = Arc::clone(&harness.models);
    let (tx, rx) = mpsc::channel();

    let outcome = std::thread::spawn(move || {
        let backend = TestSearchBackend::from_settings(
            &settings,
            &BackendRegistry::with_defaults(),
            models,
            Arc::new(SearchTestContext::new()),
        )
        .unwrap();
        tx.send(backend.index_path().unwrap().to_path_buf()).unwrap();
        panic!("simulated test failure");
    })
    .join();

    assert!(outcome.is_err());
    let path = rx.recv().unwrap();
    assert!(!path.exists());
}
