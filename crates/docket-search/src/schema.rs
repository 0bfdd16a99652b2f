//! Tantivy schema derived from a search model.
//!
//! Every model gets its own index and its own schema:
//!
//! - `_id`: object identifier (STRING | STORED), the upsert/delete key
//! - one full-text field per mapped model field (TEXT | STORED, `en_stem`)
//!
//! # Tokenizer
//!
//! Full-text fields use the English stemming tokenizer (`en_stem`):
//! SimpleTokenizer → LowerCaser → Stemmer(English). "invoices" matches
//! "invoice", "filed" matches "filing", and so on.

use std::path::Path;

use docket_core::{Error, Result, SearchModel};
use tantivy::schema::{
    Field, FieldType, IndexRecordOption, STORED, STRING, Schema, SchemaBuilder, TextFieldIndexing,
    TextOptions,
};
use tantivy::tokenizer::{Language, LowerCaser, SimpleTokenizer, Stemmer, TextAnalyzer};
use tantivy::{Index, TantivyDocument};

/// Name of the identifier field.
pub const ID_FIELD: &str = "_id";

/// Name of the analyzer used by full-text fields.
pub const TOKENIZER: &str = "en_stem";

/// A full-text field of the schema.
#[derive(Debug, Clone)]
pub struct TextField {
    /// Model field name.
    pub name: String,
    /// Tantivy field handle.
    pub field: Field,
    /// Query boost from the model.
    pub boost: f32,
}

/// Field handles of a model's index.
#[derive(Clone)]
pub struct ModelSchema {
    schema: Schema,
    id: Field,
    text_fields: Vec<TextField>,
}

impl ModelSchema {
    /// Build the schema of a model.
    ///
    /// Fails with [`Error::Config`] when a field name is not usable as a
    /// Tantivy field (empty, starts with `-`, reserved, or repeated).
    pub fn build(model: &SearchModel) -> Result<Self> {
        let mut builder = SchemaBuilder::new();

        // Positions are kept for phrase queries
        let text_options = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(TOKENIZER)
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();

        let id = builder.add_text_field(ID_FIELD, STRING | STORED);

        let mut text_fields: Vec<TextField> = Vec::with_capacity(model.fields.len());
        for search_field in &model.fields {
            let name = search_field.name.as_str();
            if !tantivy::schema::is_valid_field_name(name) || name == ID_FIELD {
                return Err(Error::config(format!(
                    "model '{}': '{name}' is not a valid index field name",
                    model.type_tag
                )));
            }
            if text_fields.iter().any(|f| f.name == name) {
                return Err(Error::config(format!(
                    "model '{}': field '{name}' is declared twice",
                    model.type_tag
                )));
            }
            let field = builder.add_text_field(name, text_options.clone());
            text_fields.push(TextField {
                name: name.to_string(),
                field,
                boost: search_field.boost,
            });
        }

        Ok(Self {
            schema: builder.build(),
            id,
            text_fields,
        })
    }

    /// Resolve the model's fields against an existing index.
    ///
    /// The index must still carry `_id` and every model field as indexed
    /// text; otherwise the index no longer matches the model and is reported
    /// as [`Error::IndexCorruption`].
    pub fn from_index(index: &Index, model: &SearchModel, path: &Path) -> Result<Self> {
        let schema = index.schema();
        let lookup = |name: &str| -> Result<Field> {
            let field = schema.get_field(name).map_err(|_| {
                Error::corruption(
                    path,
                    format!(
                        "index of '{}' has no field '{name}'; clear and rebuild it",
                        model.type_tag
                    ),
                )
            })?;
            let entry = schema.get_field_entry(field);
            if !matches!(entry.field_type(), FieldType::Str(_)) || !entry.is_indexed() {
                return Err(Error::corruption(
                    path,
                    format!(
                        "field '{name}' of the '{}' index is not indexed text",
                        model.type_tag
                    ),
                ));
            }
            Ok(field)
        };

        let id = lookup(ID_FIELD)?;
        let text_fields = model
            .fields
            .iter()
            .map(|search_field| {
                Ok(TextField {
                    name: search_field.name.clone(),
                    field: lookup(&search_field.name)?,
                    boost: search_field.boost,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            schema,
            id,
            text_fields,
        })
    }

    /// Get the underlying Tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Identifier field.
    pub fn id(&self) -> Field {
        self.id
    }

    /// Full-text fields in model order.
    pub fn text_fields(&self) -> &[TextField] {
        &self.text_fields
    }

    /// Full-text field handle by model field name.
    pub fn field(&self, name: &str) -> Option<Field> {
        self.text_fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.field)
    }

    /// Build the Tantivy document of an object from its extracted values.
    pub fn document<'a>(
        &self,
        id: &str,
        values: impl IntoIterator<Item = (&'a str, String)>,
    ) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        doc.add_text(self.id, id);
        for (name, value) in values {
            if let Some(field) = self.field(name) {
                doc.add_text(field, value);
            }
        }
        doc
    }

    /// Register custom tokenizers with a Tantivy index.
    ///
    /// Must be called after creating/opening an index to enable stemming.
    pub fn register_tokenizers(index: &Index) {
        let en_stem = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .filter(Stemmer::new(Language::English))
            .build();

        index.tokenizers().register(TOKENIZER, en_stem);
    }
}

impl std::fmt::Debug for ModelSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSchema")
            .field("text_fields", &self.text_fields)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
