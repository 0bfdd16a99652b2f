//! Swapping engines through configuration without touching call sites.

use std::sync::Arc;

use docket_core::{Error, Indexable};
use docket_search::{SearchQuery, SearchService, SearchSettings};

use crate::common::{TestHarness, document, tag};

/// A call site written once against the facade.
async fn archive_and_find(service: &SearchService, object: &dyn Indexable) -> Vec<String> {
    service.index_instance(object).await.unwrap();
    service
        .search(&SearchQuery::new(["document", "tag"], "archive"))
        .await
        .unwrap()
        .hits
        .into_iter()
        .map(|hit| format!("{}:{}", hit.type_tag, hit.id))
        .collect()
}

fn engines(harness: &TestHarness) -> Vec<SearchSettings> {
    let mut engines = vec![harness.memory_settings()];
    if cfg!(feature = "fts-tantivy") {
        engines.push(harness.tantivy_settings());
    }
    engines
}

#[tokio::test]
async fn test_same_call_site_on_every_engine() {
    let harness = TestHarness::new();
    for settings in engines(&harness) {
        let backend = settings.backend.clone();
        let service = harness.service(settings);

        let found = archive_and_find(&service, &document("1", "archive box 12")).await;
        assert_eq!(found, vec!["document:1"], "engine {backend}");

        let found = archive_and_find(&service, &tag("t1", "archive")).await;
        assert_eq!(found.len(), 2, "engine {backend}");
        assert_eq!(service.backend().await.unwrap().name(), backend);
    }
}

#[tokio::test]
async fn test_settings_from_toml() {
    let harness = TestHarness::new();
    let settings: SearchSettings = toml_settings(r#"
        backend = "memory"
        [arguments]
        index_path = "/ignored/by/memory"
        page_size = 5
    "#);
    let service = harness.service(settings);

    for i in 0..8 {
        service
            .index_instance(&document(&i.to_string(), "archive"))
            .await
            .unwrap();
    }
    let results = service
        .search(&SearchQuery::for_type("document", "archive"))
        .await
        .unwrap();
    assert_eq!(results.hits.len(), 5);
    assert_eq!(results.backend, "memory");
}

#[tokio::test]
async fn test_unknown_engine_fails_on_first_use() {
    let harness = TestHarness::new();
    let service = harness.service(SearchSettings::new("whoosh"));

    let err = service
        .index_instance(&document("1", "archive"))
        .await
        .unwrap_err();
    let Error::BackendResolution { backend, message } = err else {
        panic!("expected BackendResolution");
    };
    assert_eq!(backend, "whoosh");
    assert!(message.contains("memory"));
}

#[tokio::test]
async fn test_injected_backend_skips_resolution() {
    let harness = TestHarness::new();
    let resolved = harness.service(harness.memory_settings());
    let backend = resolved.backend().await.unwrap();

    let injected = SearchService::from_backend(backend, Arc::clone(&harness.models));
    injected
        .index_instance(&document("1", "archive"))
        .await
        .unwrap();

    // Both facades share the same engine instance
    assert_eq!(resolved.document_count("document").await.unwrap(), 1);
}

fn toml_settings(source: &str) -> SearchSettings {
    toml::from_str(source).unwrap()
}
