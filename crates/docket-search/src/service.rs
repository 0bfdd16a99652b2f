//! Search service facade.
//!
//! [`SearchService`] is the single entry point the rest of the application
//! talks to. It resolves the configured backend the first time it is needed,
//! caches it for the life of the service, and forwards every call to it.
//!
//! # Example
//!
//! ```rust,ignore
//! use docket_search::{BackendRegistry, SearchQuery, SearchService, SearchSettings};
//!
//! let service = SearchService::new(settings, BackendRegistry::with_defaults(), models);
//! service.index_instance(&document).await?;
//! let results = service.search(&SearchQuery::for_type("document", "invoice")).await?;
//! ```

use std::sync::Arc;

use docket_core::{
    Dependency, Indexable, Result, SearchModelRegistry, ServiceHandle, ServiceState,
};
use tokio::sync::OnceCell;

use crate::backend::SearchBackend;
use crate::registry::BackendRegistry;
use crate::types::{SearchHit, SearchQuery, SearchResults, SearchSettings};

/// Per-user visibility filter applied to search hits.
pub trait AccessPolicy: Send + Sync {
    /// Whether `user` may see the object behind `hit`.
    fn can_view(&self, user: &str, hit: &SearchHit) -> bool;
}

/// Facade over the configured search backend.
pub struct SearchService {
    settings: SearchSettings,
    registry: Arc<BackendRegistry>,
    models: Arc<SearchModelRegistry>,
    backend: OnceCell<Arc<dyn SearchBackend>>,
    access: Option<Arc<dyn AccessPolicy>>,
    handle: ServiceHandle,
}

impl SearchService {
    /// Create a service that resolves its backend from settings on first use.
    pub fn new(
        settings: SearchSettings,
        registry: impl Into<Arc<BackendRegistry>>,
        models: Arc<SearchModelRegistry>,
    ) -> Self {
        Self {
            settings,
            registry: registry.into(),
            models,
            backend: OnceCell::new(),
            access: None,
            handle: ServiceHandle::new("search"),
        }
    }

    /// Create a service around an already constructed backend.
    pub fn from_backend(backend: Arc<dyn SearchBackend>, models: Arc<SearchModelRegistry>) -> Self {
        let handle = ServiceHandle::new("search");
        handle.set_state(ServiceState::Ready(backend.name().to_string()));
        Self {
            settings: SearchSettings::new(backend.name()),
            registry: Arc::new(BackendRegistry::new()),
            models,
            backend: OnceCell::new_with(Some(backend)),
            access: None,
            handle,
        }
    }

    /// Filter hits through an access policy when the query names a user.
    pub fn with_access_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.access = Some(policy);
        self
    }

    /// Settings the backend is resolved from.
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Registered search models.
    pub fn models(&self) -> &Arc<SearchModelRegistry> {
        &self.models
    }

    /// Lifecycle handle of the service.
    pub fn handle(&self) -> &ServiceHandle {
        &self.handle
    }

    /// The backend, resolved on first call.
    ///
    /// Concurrent first callers wait for a single resolution. A failed
    /// resolution is not cached; the next call tries again.
    pub async fn backend(&self) -> Result<Arc<dyn SearchBackend>> {
        self.backend
            .get_or_try_init(|| async {
                self.handle.set_state(ServiceState::Resolving);
                match self
                    .registry
                    .resolve(&self.settings, Arc::clone(&self.models))
                {
                    Ok(backend) => {
                        self.handle
                            .set_state(ServiceState::Ready(backend.name().to_string()));
                        Ok(Arc::from(backend))
                    }
                    Err(e) => {
                        self.handle.set_state(ServiceState::Failed(e.to_string()));
                        Err(e)
                    }
                }
            })
            .await
            .map(Arc::clone)
    }

    /// Add or replace the index entry of an object.
    pub async fn index_instance(&self, object: &dyn Indexable) -> Result<()> {
        self.backend().await?.index_instance(object).await
    }

    /// Remove the index entry of an object.
    pub async fn deindex_instance(&self, object: &dyn Indexable) -> Result<()> {
        self.backend().await?.deindex_instance(object).await
    }

    /// Run a query, dropping hits the querying user may not view.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        let mut results = self.backend().await?.search(query).await?;

        if let (Some(policy), Some(user)) = (&self.access, &query.user) {
            let before = results.hits.len();
            results.hits.retain(|hit| policy.can_view(user, hit));
            let hidden = before - results.hits.len();
            results.total = results.total.saturating_sub(hidden);
            if hidden > 0 {
                log::debug!("search: hid {hidden} hits from '{user}'");
            }
        }
        Ok(results)
    }

    /// Number of committed entries for a type.
    pub async fn document_count(&self, type_tag: &str) -> Result<usize> {
        self.backend().await?.document_count(type_tag).await
    }

    /// Remove every entry of a type.
    pub async fn clear(&self, type_tag: &str) -> Result<()> {
        self.backend().await?.clear(type_tag).await
    }

    /// Runtime prerequisites of the backend.
    pub async fn dependencies(&self) -> Result<Vec<Dependency>> {
        Ok(self.backend().await?.dependencies())
    }
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("backend", &self.settings.backend)
            .field("state", &self.handle.state())
            .field("access_policy", &self.access.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
