//! Concurrent writers and readers on one service.

#![cfg(feature = "fts-tantivy")]

use std::sync::Arc;

use docket_search::SearchQuery;

use crate::common::{TestHarness, document, tag};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_use_opens_one_index_per_type() {
    let harness = TestHarness::new();
    let service = Arc::new(harness.service(harness.tantivy_settings()));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                let id = i.to_string();
                if i % 2 == 0 {
                    service.index_instance(&document(&id, "shared")).await
                } else {
                    service.index_instance(&tag(&id, "shared")).await
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(service.document_count("document").await.unwrap(), 4);
    assert_eq!(service.document_count("tag").await.unwrap(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_objects_are_each_found() {
    let harness = TestHarness::new();
    let service = Arc::new(harness.service(harness.tantivy_settings()));
    let words = [
        "amber", "birch", "cedar", "dune", "ember", "fjord", "grove", "heath",
    ];

    let tasks: Vec<_> = words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let service = Arc::clone(&service);
            let record = document(&i.to_string(), &format!("{word} folder"));
            tokio::spawn(async move { service.index_instance(&record).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    for (i, word) in words.iter().enumerate() {
        let results = service
            .search(&SearchQuery::for_type("document", *word))
            .await
            .unwrap();
        let id = i.to_string();
        assert_eq!(results.ids(), vec![("document", id.as_str())]);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writes_to_same_object_leave_one_entry() {
    let harness = TestHarness::new();
    let service = Arc::new(harness.service(harness.tantivy_settings()));

    let tasks: Vec<_> = ["alpha", "beta", "gamma", "delta"]
        .into_iter()
        .map(|word| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.index_instance(&document("42", word)).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(service.document_count("document").await.unwrap(), 1);
    let mut matched = 0;
    for word in ["alpha", "beta", "gamma", "delta"] {
        matched += service
            .search(&SearchQuery::for_type("document", word))
            .await
            .unwrap()
            .total;
    }
    assert_eq!(matched, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_partial_entries() {
    let harness = TestHarness::new();
    let service = Arc::new(harness.service(harness.tantivy_settings()));
    // Open the index before the race starts
    service.document_count("document").await.unwrap();

    let writer = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            for i in 0..10 {
                service
                    .index_instance(&document(&i.to_string(), "invoice march"))
                    .await
                    .unwrap();
            }
        })
    };
    let reader = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            let mut seen = 0;
            for _ in 0..20 {
                let results = service
                    .search(&SearchQuery::for_type("document", "invoice march"))
                    .await
                    .unwrap();
                // Every visible entry carries both terms, and committed entries stay visible
                assert_eq!(results.total, results.hits.len());
                assert!(results.total >= seen);
                seen = results.total;
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
    assert_eq!(service.document_count("document").await.unwrap(), 10);
}
