//! Common test utilities and harness for Docket search integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use docket_core::{IndexableRecord, SearchField, SearchModel, SearchModelRegistry};
use docket_search::{BackendRegistry, SearchService, SearchSettings};
use tempfile::TempDir;

/// Writer buffer small enough for parallel test runs.
pub const TEST_WRITER_MEMORY: usize = 15_000_000;

/// Test harness for integration tests.
///
/// Owns a scratch directory and the search models every test shares.
pub struct TestHarness {
    /// Scratch directory removed when the harness drops.
    pub dir: TempDir,
    /// Models for `document` and `tag`.
    pub models: Arc<SearchModelRegistry>,
}

impl TestHarness {
    /// Creates a harness with a fresh scratch directory.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("scratch directory"),
            models: Arc::new(test_models()),
        }
    }

    /// Configured index path under the scratch directory.
    pub fn index_path(&self) -> PathBuf {
        self.dir.path().join("index")
    }

    /// Settings for the disk engine rooted at [`index_path`](Self::index_path).
    pub fn tantivy_settings(&self) -> SearchSettings {
        SearchSettings::new("tantivy")
            .with_argument("index_path", self.index_path().to_string_lossy().to_string())
            .with_argument("writer_memory", TEST_WRITER_MEMORY)
    }

    /// Settings for the in-memory engine.
    pub fn memory_settings(&self) -> SearchSettings {
        SearchSettings::new("memory")
    }

    /// A lazily resolving service over the default registry.
    pub fn service(&self, settings: SearchSettings) -> SearchService {
        SearchService::new(
            settings,
            BackendRegistry::with_defaults(),
            Arc::clone(&self.models),
        )
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Models used across the suite.
pub fn test_models() -> SearchModelRegistry {
    SearchModelRegistry::from_models([
        SearchModel::new("document", "Document")
            .with_field(SearchField::new("label").with_boost(2.0))
            .with_field(SearchField::new("content")),
        SearchModel::new("tag", "Tag").with_field(SearchField::new("label")),
    ])
    .expect("valid models")
}

/// A document with body text.
pub fn document(id: &str, content: &str) -> IndexableRecord {
    IndexableRecord::new("document", id).with_field("content", content)
}

/// A tag with a label.
pub fn tag(id: &str, label: &str) -> IndexableRecord {
    IndexableRecord::new("tag", id).with_field("label", label)
}
