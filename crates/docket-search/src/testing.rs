//! Search backend wrapper for test runs.
//!
//! Most tests create and delete objects without caring about search. Paying
//! the indexing cost in each of them is wasteful, so [`TestSearchBackend`]
//! only forwards writes while the [`TestContext`] says a search test is
//! running. Search tests can also name a fixture object; it is indexed right
//! before every search, so the test does not have to do it itself.
//!
//! Built with [`TestSearchBackend::from_settings`] over the disk engine, the
//! wrapper gets a private temporary index directory that is removed when the
//! wrapper is dropped.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use docket_core::{Dependency, Error, Indexable, Result, SearchModelRegistry};

use crate::backend::SearchBackend;
use crate::registry::BackendRegistry;
use crate::storage::IndexLocation;
use crate::types::{DEFAULT_BACKEND, SearchQuery, SearchResults, SearchSettings};

/// Test-run state consulted by [`TestSearchBackend`].
pub trait TestContext: Send + Sync {
    /// Whether the running test exercises search.
    fn is_search_test(&self) -> bool;

    /// Name of the fixture object to index before each search.
    fn fixture_object_name(&self) -> Option<String>;

    /// Object bound to a fixture name.
    fn fixture(&self, name: &str) -> Option<Arc<dyn Indexable>>;
}

#[derive(Default)]
struct ContextState {
    search_test: bool,
    fixture_name: Option<String>,
    fixtures: HashMap<String, Arc<dyn Indexable>>,
}

/// Thread-safe [`TestContext`] driven by the test itself.
#[derive(Default)]
pub struct SearchTestContext {
    state: RwLock<ContextState>,
}

impl SearchTestContext {
    /// Create an inactive context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter search-test mode.
    pub fn activate(&self) {
        self.write().search_test = true;
    }

    /// Leave search-test mode.
    pub fn deactivate(&self) {
        self.write().search_test = false;
    }

    /// Index the object bound to `name` before each search.
    pub fn set_fixture_object_name(&self, name: impl Into<String>) {
        self.write().fixture_name = Some(name.into());
    }

    /// Stop indexing a fixture before searches.
    pub fn clear_fixture_object_name(&self) {
        self.write().fixture_name = None;
    }

    /// Bind an object to a fixture name.
    pub fn bind(&self, name: impl Into<String>, object: Arc<dyn Indexable>) {
        self.write().fixtures.insert(name.into(), object);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ContextState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ContextState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TestContext for SearchTestContext {
    fn is_search_test(&self) -> bool {
        self.read().search_test
    }

    fn fixture_object_name(&self) -> Option<String> {
        self.read().fixture_name.clone()
    }

    fn fixture(&self, name: &str) -> Option<Arc<dyn Indexable>> {
        self.read().fixtures.get(name).cloned()
    }
}

impl std::fmt::Debug for SearchTestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("SearchTestContext")
            .field("search_test", &state.search_test)
            .field("fixture_name", &state.fixture_name)
            .field("fixtures", &state.fixtures.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Gating wrapper around a real backend.
pub struct TestSearchBackend {
    // Field order is drop order: the inner backend releases its index
    // before the temporary directory is removed.
    inner: Box<dyn SearchBackend>,
    context: Arc<dyn TestContext>,
    location: Option<IndexLocation>,
}

impl TestSearchBackend {
    /// Wrap an existing backend.
    pub fn wrap(inner: Box<dyn SearchBackend>, context: Arc<dyn TestContext>) -> Self {
        Self {
            inner,
            context,
            location: None,
        }
    }

    /// Resolve the configured backend and wrap it.
    ///
    /// For the disk engine, `index_path` is replaced by a fresh temporary
    /// directory owned by the wrapper. Other arguments are kept.
    pub fn from_settings(
        settings: &SearchSettings,
        registry: &BackendRegistry,
        models: Arc<SearchModelRegistry>,
        context: Arc<dyn TestContext>,
    ) -> Result<Self> {
        let mut settings = settings.clone();
        let location = if settings.backend == DEFAULT_BACKEND {
            let location = IndexLocation::temporary()?;
            settings
                .arguments
                .set("index_path", location.path().to_string_lossy().into_owned());
            Some(location)
        } else {
            None
        };

        let inner = registry.resolve(&settings, models)?;
        Ok(Self {
            inner,
            context,
            location,
        })
    }

    /// Temporary index directory owned by the wrapper, if any.
    pub fn index_path(&self) -> Option<&Path> {
        self.location.as_ref().map(IndexLocation::path)
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &dyn SearchBackend {
        self.inner.as_ref()
    }
}

#[async_trait]
impl SearchBackend for TestSearchBackend {
    async fn index_instance(&self, object: &dyn Indexable) -> Result<()> {
        if !self.context.is_search_test() {
            log::trace!(
                "test backend: skipped index of {}:{}",
                object.type_tag(),
                object.object_id()
            );
            return Ok(());
        }
        self.inner.index_instance(object).await
    }

    async fn deindex_instance(&self, object: &dyn Indexable) -> Result<()> {
        if !self.context.is_search_test() {
            return Ok(());
        }
        self.inner.deindex_instance(object).await
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        if self.context.is_search_test()
            && let Some(name) = self.context.fixture_object_name()
        {
            let object = self
                .context
                .fixture(&name)
                .ok_or_else(|| Error::FixtureNotBound(name.clone()))?;
            log::debug!("test backend: indexing fixture '{name}' before search");
            self.inner.index_instance(object.as_ref()).await?;
        }
        self.inner.search(query).await
    }

    async fn document_count(&self, type_tag: &str) -> Result<usize> {
        self.inner.document_count(type_tag).await
    }

    async fn clear(&self, type_tag: &str) -> Result<()> {
        if !self.context.is_search_test() {
            return Ok(());
        }
        self.inner.clear(type_tag).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn dependencies(&self) -> Vec<Dependency> {
        self.inner.dependencies()
    }
}

impl std::fmt::Debug for TestSearchBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSearchBackend")
            .field("inner", &self.inner.name())
            .field("index_path", &self.index_path())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
