//! Indexable objects and per-type field mappings.
//!
//! Domain objects become searchable by implementing [`Indexable`]. Which of
//! their fields end up in the index is decided by the [`SearchModel`]
//! registered for their type tag.
//!
//! # Example
//!
//! ```rust
//! use docket_core::{Indexable, IndexableRecord, SearchField, SearchModel, SearchModelRegistry};
//!
//! let mut models = SearchModelRegistry::new();
//! models
//!     .register(
//!         SearchModel::new("document", "Document")
//!             .with_field(SearchField::new("label").with_boost(2.0))
//!             .with_field(SearchField::new("content")),
//!     )
//!     .unwrap();
//!
//! let record = IndexableRecord::new("document", "42").with_field("content", "invoice march");
//! let model = models.get(record.type_tag()).unwrap();
//! assert_eq!(model.fields.len(), 2);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Indexable
// ============================================================================

/// A domain object that can be written to a search index.
///
/// The pair (`type_tag`, `object_id`) addresses exactly one index entry.
pub trait Indexable: Send + Sync {
    /// Type tag selecting the search model (e.g. `"document"`).
    fn type_tag(&self) -> &str;

    /// Stable identifier, unique within the type.
    fn object_id(&self) -> String;

    /// Value of a mapped field, or `None` if the object has no value for it.
    fn field_value(&self, field: &str) -> Option<String>;
}

impl fmt::Debug for dyn Indexable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Indexable")
            .field("type_tag", &self.type_tag())
            .field("object_id", &self.object_id())
            .finish()
    }
}

/// Plain serializable [`Indexable`] implementation.
///
/// Used wherever objects arrive as data (record files, fixtures) rather than
/// as live domain types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexableRecord {
    /// Type tag.
    #[serde(rename = "type")]
    pub type_tag: String,

    /// Identifier; JSON numbers are accepted and stored as text.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// Field values by name.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl IndexableRecord {
    /// Create a record with no field values.
    pub fn new(type_tag: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

impl Indexable for IndexableRecord {
    fn type_tag(&self) -> &str {
        &self.type_tag
    }

    fn object_id(&self) -> String {
        self.id.clone()
    }

    fn field_value(&self, field: &str) -> Option<String> {
        self.fields.get(field).cloned()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Signed(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    })
}

// ============================================================================
// SearchModel
// ============================================================================

/// One mapped field of a search model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchField {
    /// Field name passed to [`Indexable::field_value`].
    pub name: String,

    /// Human readable label (defaults to the name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Query-time boost.
    #[serde(default = "default_boost")]
    pub boost: f32,
}

fn default_boost() -> f32 {
    1.0
}

impl SearchField {
    /// Create a field with boost 1.0.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            boost: default_boost(),
        }
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the query-time boost.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Label, falling back to the field name.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Field mapping for one indexable type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchModel {
    /// Type tag this model applies to.
    pub type_tag: String,

    /// Human readable label.
    #[serde(default)]
    pub label: String,

    /// Mapped fields, in declaration order.
    #[serde(default)]
    pub fields: Vec<SearchField>,
}

impl SearchModel {
    /// Create a model without fields.
    pub fn new(type_tag: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            label: label.into(),
            fields: Vec::new(),
        }
    }

    /// Append a mapped field.
    pub fn with_field(mut self, field: SearchField) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a mapped field by name.
    pub fn field(&self, name: &str) -> Option<&SearchField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Extract the mapped field values of an object, skipping absent and blank ones.
    pub fn extract(&self, object: &dyn Indexable) -> Vec<(&SearchField, String)> {
        self.fields
            .iter()
            .filter_map(|field| {
                object
                    .field_value(&field.name)
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| (field, value))
            })
            .collect()
    }
}

// ============================================================================
// SearchModelRegistry
// ============================================================================

/// Registry of search models keyed by type tag.
///
/// Populated once at startup by the producers of indexable objects, then
/// shared read-only (typically behind an `Arc`).
#[derive(Debug, Clone, Default)]
pub struct SearchModelRegistry {
    models: BTreeMap<String, SearchModel>,
}

impl SearchModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of models.
    pub fn from_models(models: impl IntoIterator<Item = SearchModel>) -> Result<Self> {
        let mut registry = Self::new();
        for model in models {
            registry.register(model)?;
        }
        Ok(registry)
    }

    /// Register a model. Fails if the type tag is already taken or the model is unusable.
    pub fn register(&mut self, model: SearchModel) -> Result<()> {
        if model.type_tag.trim().is_empty() {
            return Err(Error::config("search model type tag must not be empty"));
        }
        if model.fields.is_empty() {
            return Err(Error::config(format!(
                "search model '{}' declares no fields",
                model.type_tag
            )));
        }
        if self.models.contains_key(&model.type_tag) {
            return Err(Error::DuplicateModel(model.type_tag));
        }
        log::debug!(
            "Registered search model '{}' ({} fields)",
            model.type_tag,
            model.fields.len()
        );
        self.models.insert(model.type_tag.clone(), model);
        Ok(())
    }

    /// Get the model for a type tag.
    pub fn get(&self, type_tag: &str) -> Result<&SearchModel> {
        self.models
            .get(type_tag)
            .ok_or_else(|| Error::ModelNotFound(type_tag.to_string()))
    }

    /// Whether a type tag has a model.
    pub fn contains(&self, type_tag: &str) -> bool {
        self.models.contains_key(type_tag)
    }

    /// Registered type tags, sorted.
    pub fn type_tags(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    /// Iterate over registered models.
    pub fn iter(&self) -> impl Iterator<Item = &SearchModel> {
        self.models.values()
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no model is registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
