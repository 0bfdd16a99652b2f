//! Tantivy-based search backend.
//!
//! `TantivySearch` keeps one [`ModelIndex`] per search model under
//! `<index_path>/<type_tag>/`. Indexes are opened (or created) the first
//! time a type is touched, so resolving the backend has no side effect on
//! disk beyond what a caller actually uses.
//!
//! # Arguments
//!
//! | Name            | Required | Default    |
//! |-----------------|----------|------------|
//! | `index_path`    | yes      |            |
//! | `page_size`     | no       | 100        |
//! | `writer_memory` | no       | 50 000 000 |

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use docket_core::{Dependency, Error, Indexable, Result, SearchModelRegistry};

use crate::backend::SearchBackend;
use crate::indexer::{DEFAULT_WRITER_MEMORY, ModelIndex};
use crate::storage::IndexLocation;
use crate::types::{BackendArguments, SearchHit, SearchQuery, SearchResults};

/// Registry key of this backend.
pub const BACKEND_NAME: &str = "tantivy";

/// Hits returned when the query sets no smaller limit.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Version of the tantivy crate this backend is built against.
const TANTIVY_VERSION: &str = "0.25";

/// Tantivy search backend.
pub struct TantivySearch {
    location: IndexLocation,
    models: Arc<SearchModelRegistry>,
    page_size: usize,
    writer_memory: usize,
    indexes: RwLock<HashMap<String, Arc<ModelIndex>>>,
}

impl TantivySearch {
    /// Create the backend from its arguments.
    ///
    /// Only validates arguments; no directory is created until a type is
    /// first indexed or searched.
    pub fn new(args: &BackendArguments, models: Arc<SearchModelRegistry>) -> Result<Self> {
        let index_path = args.require_str("index_path")?;
        if index_path.trim().is_empty() {
            return Err(Error::config("argument 'index_path' must not be empty"));
        }
        let page_size = args.usize("page_size")?.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(Error::config("argument 'page_size' must be at least 1"));
        }
        let writer_memory = args
            .usize("writer_memory")?
            .unwrap_or(DEFAULT_WRITER_MEMORY);

        Ok(Self::with_location(IndexLocation::persistent(index_path), models)
            .page_size(page_size)
            .writer_memory(writer_memory))
    }

    /// Create the backend over an explicit location.
    pub fn with_location(location: IndexLocation, models: Arc<SearchModelRegistry>) -> Self {
        Self {
            location,
            models,
            page_size: DEFAULT_PAGE_SIZE,
            writer_memory: DEFAULT_WRITER_MEMORY,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    /// Set the page size.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the index writer buffer size.
    pub fn writer_memory(mut self, writer_memory: usize) -> Self {
        self.writer_memory = writer_memory;
        self
    }

    /// Root directory of the backend's indexes.
    pub fn index_path(&self) -> &Path {
        self.location.path()
    }

    /// The index of a type, opened on first use.
    fn model_index(&self, type_tag: &str) -> Result<Arc<ModelIndex>> {
        let model = self.models.get(type_tag)?;

        if let Some(index) = self.read_indexes()?.get(type_tag) {
            return Ok(Arc::clone(index));
        }

        let mut indexes = self
            .indexes
            .write()
            .map_err(|_| Error::operation("index table lock poisoned"))?;
        // Another task may have opened it while we waited for the lock
        if let Some(index) = indexes.get(type_tag) {
            return Ok(Arc::clone(index));
        }

        self.location.ensure()?;
        let path = self.location.model_path(type_tag);
        let index = ModelIndex::open_or_create(&path, model, self.writer_memory)
            .inspect_err(|e| {
                if let Error::IndexCorruption { message, .. } = e {
                    log::warn!("Index of '{type_tag}' at {} is unusable: {message}", path.display());
                }
            })?;
        let index = Arc::new(index);
        indexes.insert(type_tag.to_string(), Arc::clone(&index));
        Ok(index)
    }

    fn read_indexes(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Arc<ModelIndex>>>> {
        self.indexes
            .read()
            .map_err(|_| Error::operation("index table lock poisoned"))
    }

    fn index_sync(&self, object: &dyn Indexable) -> Result<()> {
        let type_tag = object.type_tag();
        let index = self.model_index(type_tag)?;
        let model = self.models.get(type_tag)?;
        let id = object.object_id();

        let values = model
            .extract(object)
            .into_iter()
            .map(|(field, value)| (field.name.as_str(), value));
        index.upsert(&id, values)?;
        log::debug!("tantivy: indexed {type_tag}:{id}");
        Ok(())
    }

    fn deindex_sync(&self, object: &dyn Indexable) -> Result<()> {
        let type_tag = object.type_tag();
        let id = object.object_id();
        self.model_index(type_tag)?.delete(&id)?;
        log::debug!("tantivy: deindexed {type_tag}:{id}");
        Ok(())
    }

    fn search_sync(&self, query: &SearchQuery) -> Result<SearchResults> {
        let indexes = query
            .distinct_type_tags()
            .into_iter()
            .map(|type_tag| self.model_index(type_tag))
            .collect::<Result<Vec<_>>>()?;

        if query.text.trim().is_empty() {
            return Ok(SearchResults::empty(BACKEND_NAME));
        }

        let limit = query.effective_limit(self.page_size);
        let mut hits = Vec::new();
        let mut total = 0;
        for index in &indexes {
            let (type_hits, type_total) = index.search(&query.text, limit)?;
            total += type_total;
            hits.extend(
                type_hits
                    .into_iter()
                    .map(|(id, score)| SearchHit::new(index.type_tag(), id, score)),
            );
        }

        log::debug!(
            "tantivy: '{}' over {:?} matched {total}",
            query.text,
            query.type_tags
        );
        Ok(SearchResults::ranked(BACKEND_NAME, hits, total, limit))
    }
}

#[async_trait]
impl SearchBackend for TantivySearch {
    async fn index_instance(&self, object: &dyn Indexable) -> Result<()> {
        self.index_sync(object)
    }

    async fn deindex_instance(&self, object: &dyn Indexable) -> Result<()> {
        self.deindex_sync(object)
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        self.search_sync(query)
    }

    async fn document_count(&self, type_tag: &str) -> Result<usize> {
        Ok(self.model_index(type_tag)?.count())
    }

    async fn clear(&self, type_tag: &str) -> Result<()> {
        self.model_index(type_tag)?.clear()?;
        log::info!("tantivy: cleared index for '{type_tag}'");
        Ok(())
    }

    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![
            Dependency::library("docket_search::tantivy_search", "tantivy", TANTIVY_VERSION)
                .with_help("full-text engine linked into the binary"),
        ]
    }
}

impl std::fmt::Debug for TantivySearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TantivySearch")
            .field("index_path", &self.location.path())
            .field("page_size", &self.page_size)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
