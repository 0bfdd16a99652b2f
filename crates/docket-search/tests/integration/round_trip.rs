//! Index → search → deindex through the service facade on the disk engine.

#![cfg(feature = "fts-tantivy")]

use docket_core::Error;
use docket_search::{SearchQuery, SearchSettings};

use crate::common::{TestHarness, document, tag};

#[tokio::test]
async fn test_index_search_deindex() {
    let harness = TestHarness::new();
    let service = harness.service(harness.tantivy_settings());
    let invoice = document("42", "invoice march");

    service.index_instance(&invoice).await.unwrap();
    let results = service
        .search(&SearchQuery::for_type("document", "invoice"))
        .await
        .unwrap();
    assert_eq!(results.ids(), vec![("document", "42")]);

    service.deindex_instance(&invoice).await.unwrap();
    let results = service
        .search(&SearchQuery::for_type("document", "invoice"))
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_entries_survive_restart() {
    let harness = TestHarness::new();
    {
        let service = harness.service(harness.tantivy_settings());
        service
            .index_instance(&document("1", "annual audit report"))
            .await
            .unwrap();
        service.index_instance(&tag("t1", "audit")).await.unwrap();
    }

    let service = harness.service(harness.tantivy_settings());
    let results = service
        .search(&SearchQuery::new(["document", "tag"], "audit"))
        .await
        .unwrap();
    assert_eq!(results.total, 2);
    assert!(harness.index_path().join("document").is_dir());
    assert!(harness.index_path().join("tag").is_dir());
}

#[tokio::test]
async fn test_reindex_reflects_latest_values() {
    let harness = TestHarness::new();
    let service = harness.service(harness.tantivy_settings());

    service
        .index_instance(&document("7", "pending approval"))
        .await
        .unwrap();
    service
        .index_instance(&document("7", "approved and archived"))
        .await
        .unwrap();

    assert_eq!(service.document_count("document").await.unwrap(), 1);
    let pending = service
        .search(&SearchQuery::for_type("document", "pending"))
        .await
        .unwrap();
    assert!(pending.is_empty());
    let archived = service
        .search(&SearchQuery::for_type("document", "archived"))
        .await
        .unwrap();
    assert_eq!(archived.ids(), vec![("document", "7")]);
}

#[tokio::test]
async fn test_limit_and_page_size() {
    let harness = TestHarness::new();
    let settings = harness.tantivy_settings().with_argument("page_size", 3);
    let service = harness.service(settings);
    for i in 0..6 {
        service
            .index_instance(&document(&i.to_string(), "quarterly ledger"))
            .await
            .unwrap();
    }

    let paged = service
        .search(&SearchQuery::for_type("document", "ledger"))
        .await
        .unwrap();
    assert_eq!(paged.hits.len(), 3);
    assert_eq!(paged.total, 6);

    let limited = service
        .search(&SearchQuery::for_type("document", "ledger").with_limit(2))
        .await
        .unwrap();
    assert_eq!(limited.hits.len(), 2);
}

#[tokio::test]
async fn test_missing_index_path_is_config_error() {
    let harness = TestHarness::new();
    let service = harness.service(SearchSettings::new("tantivy"));

    let err = service
        .index_instance(&document("1", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(msg) if msg.contains("index_path")));
    assert!(service.handle().state().is_failed());
}

#[tokio::test]
async fn test_unwritable_index_path_is_storage_unavailable() {
    let harness = TestHarness::new();
    let blocker = harness.dir.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();
    let settings = SearchSettings::new("tantivy")
        .with_argument("index_path", blocker.to_string_lossy().to_string());
    let service = harness.service(settings);

    let err = service
        .index_instance(&document("1", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StorageUnavailable { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_corrupt_index_is_not_rebuilt() {
    let harness = TestHarness::new();
    let type_dir = harness.index_path().join("document");
    std::fs::create_dir_all(&type_dir).unwrap();
    std::fs::write(type_dir.join("meta.json"), b"garbage").unwrap();

    let service = harness.service(harness.tantivy_settings());
    let err = service
        .search(&SearchQuery::for_type("document", "invoice"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IndexCorruption { .. }));
    assert_eq!(std::fs::read(type_dir.join("meta.json")).unwrap(), b"garbage");
}

#[tokio::test]
async fn test_query_syntax_error_has_no_side_effect() {
    let harness = TestHarness::new();
    let service = harness.service(harness.tantivy_settings());
    service
        .index_instance(&document("1", "invoice"))
        .await
        .unwrap();

    let err = service
        .search(&SearchQuery::for_type("document", "nosuchfield:invoice"))
        .await
        .unwrap_err();
    assert!(err.is_recoverable());

    let results = service
        .search(&SearchQuery::for_type("document", "invoice"))
        .await
        .unwrap();
    assert_eq!(results.total, 1);
}

#[tokio::test]
async fn test_clear_then_rebuild() {
    let harness = TestHarness::new();
    let service = harness.service(harness.tantivy_settings());
    service
        .index_instance(&document("1", "invoice"))
        .await
        .unwrap();

    service.clear("document").await.unwrap();
    assert_eq!(service.document_count("document").await.unwrap(), 0);

    service
        .index_instance(&document("1", "invoice"))
        .await
        .unwrap();
    assert_eq!(service.document_count("document").await.unwrap(), 1);
}
