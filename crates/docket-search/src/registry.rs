//! Backend registry: configuration key → backend constructor.
//!
//! The registry is how a deployment picks its engine. Every engine registers
//! a constructor under a key; [`BackendRegistry::resolve`] looks the
//! configured key up and builds the backend from the configured arguments.
//!
//! # Example
//!
//! ```rust,ignore
//! use docket_search::{BackendRegistry, SearchSettings};
//!
//! let registry = BackendRegistry::with_defaults();
//! let settings = SearchSettings::new("memory");
//! let backend = registry.resolve(&settings, models)?;
//! assert_eq!(backend.name(), "memory");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use docket_core::{Error, Result, SearchModelRegistry};

use crate::backend::SearchBackend;
use crate::types::{BackendArguments, SearchSettings};

/// Function building a backend from its arguments and the model registry.
pub type BackendConstructor = Arc<
    dyn Fn(&BackendArguments, Arc<SearchModelRegistry>) -> Result<Box<dyn SearchBackend>>
        + Send
        + Sync,
>;

/// Maps configuration keys to backend constructors.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    constructors: BTreeMap<String, BackendConstructor>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every engine shipped in this crate.
    ///
    /// - `"tantivy"` → [`TantivySearch`](crate::TantivySearch) (with `fts-tantivy`)
    /// - `"memory"` → [`MemorySearch`](crate::MemorySearch)
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "fts-tantivy")]
        registry.register(
            crate::tantivy_search::BACKEND_NAME,
            |args: &BackendArguments, models: Arc<SearchModelRegistry>| {
                let backend = crate::tantivy_search::TantivySearch::new(args, models)?;
                Ok(Box::new(backend) as Box<dyn SearchBackend>)
            },
        );

        registry.register(
            crate::memory::BACKEND_NAME,
            |args: &BackendArguments, models: Arc<SearchModelRegistry>| {
                let backend = crate::memory::MemorySearch::new(args, models)?;
                Ok(Box::new(backend) as Box<dyn SearchBackend>)
            },
        );

        registry
    }

    /// Register a constructor under a key, replacing any previous one.
    pub fn register<F>(&mut self, key: impl Into<String>, constructor: F)
    where
        F: Fn(&BackendArguments, Arc<SearchModelRegistry>) -> Result<Box<dyn SearchBackend>>
            + Send
            + Sync
            + 'static,
    {
        self.constructors.insert(key.into(), Arc::new(constructor));
    }

    /// Whether a key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.constructors.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Build the backend named by the settings.
    ///
    /// Arguments are handed to the constructor unmodified; an unknown key
    /// fails with [`Error::BackendResolution`]. Constructor errors are
    /// returned as they are.
    pub fn resolve(
        &self,
        settings: &SearchSettings,
        models: Arc<SearchModelRegistry>,
    ) -> Result<Box<dyn SearchBackend>> {
        let constructor = self.constructors.get(&settings.backend).ok_or_else(|| {
            Error::resolution(
                &settings.backend,
                format!("not registered (available: {})", self.keys().join(", ")),
            )
        })?;

        let backend = constructor(&settings.arguments, models)?;
        log::info!(
            "Resolved search backend '{}' ({})",
            settings.backend,
            backend.name()
        );
        Ok(backend)
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
