//! Search backend trait.
//!
//! This module defines the `SearchBackend` trait that every engine must
//! satisfy. Call sites only ever see `dyn SearchBackend`, which is what makes
//! engines swappable from configuration.
//!
//! # Backends
//!
//! - `TantivySearch`: on-disk full-text index (requires `fts-tantivy` feature)
//! - `MemorySearch`: in-process inverted index
//! - `TestSearchBackend`: gating wrapper for test runs
//!
//! # Example
//!
//! ```rust,ignore
//! use docket_search::{BackendRegistry, SearchQuery, SearchSettings};
//!
//! let settings = SearchSettings::new("tantivy").with_argument("index_path", "/tmp/idx1");
//! let backend = BackendRegistry::with_defaults().resolve(&settings, models)?;
//!
//! backend.index_instance(&document).await?;
//! let results = backend.search(&SearchQuery::for_type("document", "invoice")).await?;
//! ```

use async_trait::async_trait;
use docket_core::{Dependency, Indexable, Result};

use crate::types::{SearchQuery, SearchResults};

/// Abstract search backend trait.
///
/// # Contract
///
/// - `index_instance` upserts the entry for `(type_tag, object_id)`; calling
///   it twice leaves the same state as calling it once.
/// - `deindex_instance` removes the entry if present; removing an absent
///   entry succeeds.
/// - `search` returns hits by descending relevance and never mutates the
///   index. Writes become visible to searches only once fully committed.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Add or replace the index entry of an object.
    async fn index_instance(&self, object: &dyn Indexable) -> Result<()>;

    /// Remove the index entry of an object.
    async fn deindex_instance(&self, object: &dyn Indexable) -> Result<()>;

    /// Execute a query restricted to the query's type tags.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults>;

    /// Number of committed entries for a type.
    async fn document_count(&self, type_tag: &str) -> Result<usize>;

    /// Remove every entry of a type.
    async fn clear(&self, type_tag: &str) -> Result<()>;

    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    /// Runtime prerequisites, for operational tooling.
    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }
}
