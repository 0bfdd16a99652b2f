//! Docket Core: shared types, traits, and errors for the search layer.
//!
//! This crate provides the foundational types used across all Docket crates.
//! It has no internal Docket dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`model`]: Indexable objects and per-type field mappings
//! - [`service`]: Service lifecycle state tracking
//! - [`dependency`]: Informational runtime prerequisite declarations

#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod dependency;
pub mod error;
pub mod model;
pub mod service;

// Re-export key types at crate root for convenience
pub use dependency::{Dependency, DependencyKind, DependencyStatus};
pub use error::{Error, Result};
pub use model::{Indexable, IndexableRecord, SearchField, SearchModel, SearchModelRegistry};
pub use service::{ServiceHandle, ServiceState};
