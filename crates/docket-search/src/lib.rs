//! Pluggable full-text search for Docket.
//!
//! Callers index, deindex and search objects through one interface,
//! [`SearchBackend`], without knowing which engine sits behind it. The engine
//! is chosen by configuration and resolved through a [`BackendRegistry`].
//!
//! # Features
//!
//! - `fts-tantivy` (default): Tantivy-based on-disk engine
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      docket-search                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SearchService (lazy, resolve-once facade)                  │
//! │  └── AccessPolicy (optional per-user hit filter)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  BackendRegistry (config key → constructor)                 │
//! │  SearchBackend trait                                        │
//! │  ├── TantivySearch (per-model Tantivy indexes)              │
//! │  ├── MemorySearch (in-process inverted index)               │
//! │  └── TestSearchBackend (gating wrapper for tests)           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ModelSchema / ModelIndex (Tantivy plumbing)                │
//! │  IndexLocation (persistent or temporary index directory)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docket_search::{BackendRegistry, SearchQuery, SearchService, SearchSettings};
//!
//! let settings = SearchSettings::new("tantivy").with_argument("index_path", "/var/lib/docket");
//! let service = SearchService::new(settings, BackendRegistry::with_defaults(), models);
//!
//! service.index_instance(&document).await?;
//! let results = service.search(&SearchQuery::for_type("document", "invoice")).await?;
//! for hit in &results.hits {
//!     println!("{}:{} ({:.2})", hit.type_tag, hit.id, hit.score);
//! }
//! ```

#![warn(clippy::all)]
#![forbid(unsafe_code)]

// Core modules (always available)
pub mod backend;
pub mod memory;
pub mod registry;
pub mod service;
pub mod storage;
pub mod testing;
pub mod types;

// Feature-gated Tantivy modules
#[cfg(feature = "fts-tantivy")]
pub mod indexer;

#[cfg(feature = "fts-tantivy")]
pub mod schema;

#[cfg(feature = "fts-tantivy")]
pub mod tantivy_search;

// Re-exports
pub use backend::SearchBackend;
pub use memory::MemorySearch;
pub use registry::{BackendConstructor, BackendRegistry};
pub use service::{AccessPolicy, SearchService};
pub use storage::IndexLocation;
pub use testing::{SearchTestContext, TestContext, TestSearchBackend};
pub use types::{
    BackendArguments, DEFAULT_BACKEND, SearchHit, SearchQuery, SearchResults, SearchSettings,
};

#[cfg(feature = "fts-tantivy")]
pub use indexer::ModelIndex;

#[cfg(feature = "fts-tantivy")]
pub use schema::ModelSchema;

#[cfg(feature = "fts-tantivy")]
pub use tantivy_search::TantivySearch;
