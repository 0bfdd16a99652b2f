//! Common types shared by every search backend.
//!
//! These types are always available regardless of feature flags.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use docket_core::{Error, Result};

/// Backend key of the default disk-based engine.
pub const DEFAULT_BACKEND: &str = "tantivy";

// ============================================================================
// Configuration
// ============================================================================

/// Search backend configuration: which engine, and how to build it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Backend key looked up in the [`BackendRegistry`](crate::BackendRegistry).
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Constructor arguments, passed to the backend unmodified.
    #[serde(default)]
    pub arguments: BackendArguments,
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            arguments: BackendArguments::default(),
        }
    }
}

impl SearchSettings {
    /// Settings for the given backend key with no arguments.
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            arguments: BackendArguments::default(),
        }
    }

    /// Add a constructor argument.
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.set(name, value);
        self
    }
}

/// Name → value mapping handed to a backend constructor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendArguments(Map<String, Value>);

impl BackendArguments {
    /// Create an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an argument, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Raw argument value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Optional string argument. Present but not a string is a config error.
    pub fn str(&self, name: &str) -> Result<Option<&str>> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(Error::config(format!(
                "argument '{name}' must be a string, got {other}"
            ))),
        }
    }

    /// Required string argument.
    pub fn require_str(&self, name: &str) -> Result<&str> {
        self.str(name)?
            .ok_or_else(|| Error::config(format!("missing required argument '{name}'")))
    }

    /// Optional non-negative integer argument.
    pub fn usize(&self, name: &str) -> Result<Option<usize>> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| {
                    Error::config(format!(
                        "argument '{name}' must be a non-negative integer, got {value}"
                    ))
                }),
        }
    }

    /// Argument names, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether no argument is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Queries and results
// ============================================================================

/// A search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Type tags the search is restricted to.
    pub type_tags: Vec<String>,

    /// Free-text query expression.
    pub text: String,

    /// User on whose behalf the search runs (enables access filtering).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Maximum hits to return; never above the engine's page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Query over several types.
    pub fn new<I, S>(type_tags: I, text: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            type_tags: type_tags.into_iter().map(Into::into).collect(),
            text: text.into(),
            user: None,
            limit: None,
        }
    }

    /// Query over a single type.
    pub fn for_type(type_tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new([type_tag.into()], text)
    }

    /// Run the search on behalf of a user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Cap the number of hits.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Requested type tags with repeats removed, in first-seen order.
    pub fn distinct_type_tags(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.type_tags
            .iter()
            .map(String::as_str)
            .filter(|type_tag| seen.insert(*type_tag))
            .collect()
    }

    /// Effective hit cap given the engine page size.
    pub fn effective_limit(&self, page_size: usize) -> usize {
        self.limit.map_or(page_size, |limit| limit.min(page_size))
    }
}

/// One matching object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Type tag of the matching object.
    pub type_tag: String,
    /// Identifier of the matching object.
    pub id: String,
    /// Relevance score (higher is better).
    pub score: f32,
}

impl SearchHit {
    /// Create a hit.
    pub fn new(type_tag: impl Into<String>, id: impl Into<String>, score: f32) -> Self {
        Self {
            type_tag: type_tag.into(),
            id: id.into(),
            score,
        }
    }
}

/// Ordered search hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Hits by descending relevance.
    pub hits: Vec<SearchHit>,

    /// Number of matching objects (may exceed `hits.len()` when capped).
    pub total: usize,

    /// Backend that executed the search.
    pub backend: String,
}

impl SearchResults {
    /// Create empty results.
    pub fn empty(backend: &str) -> Self {
        Self {
            hits: Vec::new(),
            total: 0,
            backend: backend.to_string(),
        }
    }

    /// Build results from unsorted hits: order by score, then cap.
    pub fn ranked(backend: &str, mut hits: Vec<SearchHit>, total: usize, limit: usize) -> Self {
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.type_tag.cmp(&b.type_tag))
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        Self {
            hits,
            total,
            backend: backend.to_string(),
        }
    }

    /// `(type_tag, id)` pairs in rank order.
    pub fn ids(&self) -> Vec<(&str, &str)> {
        self.hits
            .iter()
            .map(|hit| (hit.type_tag.as_str(), hit.id.as_str()))
            .collect()
    }

    /// Whether there are no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = SearchSettings::default();
        assert_eq!(settings.backend, "tantivy");
        assert!(settings.arguments.is_empty());
    }

    #[test]
    fn test_settings_deserialization_with_defaults() {
        let settings: SearchSettings =
            serde_json::from_str(r#"{"arguments": {"index_path": "/tmp/idx1"}}"#).unwrap();
        assert_eq!(settings.backend, "tantivy");
        assert_eq!(
            settings.arguments.require_str("index_path").unwrap(),
            "/tmp/idx1"
        );
    }

    #[test]
    fn test_arguments_typed_access() {
        let settings = SearchSettings::new("tantivy")
            .with_argument("index_path", "/var/lib/docket")
            .with_argument("page_size", 25);
        let args = &settings.arguments;

        assert_eq!(args.str("index_path").unwrap(), Some("/var/lib/docket"));
        assert_eq!(args.usize("page_size").unwrap(), Some(25));
        assert_eq!(args.usize("writer_memory").unwrap(), None);
        assert_eq!(args.names().collect::<Vec<_>>().len(), 2);
    }

    #[test]
    fn test_arguments_type_errors() {
        let mut args = BackendArguments::new();
        args.set("index_path", 12);
        args.set("page_size", "ten");
        args.set("negative", -1);

        assert!(matches!(args.str("index_path"), Err(Error::Config(_))));
        assert!(matches!(args.usize("page_size"), Err(Error::Config(_))));
        assert!(matches!(args.usize("negative"), Err(Error::Config(_))));

        let err = BackendArguments::new().require_str("index_path").unwrap_err();
        assert!(err.to_string().contains("missing required argument 'index_path'"));
    }

    #[test]
    fn test_query_effective_limit() {
        let query = SearchQuery::for_type("document", "invoice");
        assert_eq!(query.effective_limit(100), 100);
        assert_eq!(query.clone().with_limit(5).effective_limit(100), 5);
        assert_eq!(query.with_limit(500).effective_limit(100), 100);
    }

    #[test]
    fn test_query_distinct_type_tags() {
        let query = SearchQuery::new(["document", "tag", "document", "tag"], "march");
        assert_eq!(query.distinct_type_tags(), vec!["document", "tag"]);
    }

    #[test]
    fn test_query_serialization_skips_none() {
        let query = SearchQuery::new(["document", "tag"], "march");
        let json = serde_json::to_string(&query).unwrap();
        assert!(json.contains("\"type_tags\":[\"document\",\"tag\"]"));
        assert!(!json.contains("user"));
        assert!(!json.contains("limit"));
    }

    #[test]
    fn test_results_ranked() {
        let hits = vec![
            SearchHit::new("tag", "b", 0.5),
            SearchHit::new("document", "a", 2.0),
            SearchHit::new("document", "c", 0.5),
        ];
        let results = SearchResults::ranked("memory", hits, 3, 2);
        assert_eq!(results.ids(), vec![("document", "a"), ("document", "c")]);
        assert_eq!(results.total, 3);
        assert_eq!(results.backend, "memory");
    }

    #[test]
    fn test_results_empty() {
        let results = SearchResults::empty("tantivy");
        assert!(results.is_empty());
        assert_eq!(results.total, 0);
    }
}
