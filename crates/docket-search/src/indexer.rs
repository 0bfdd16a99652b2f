//! Per-model Tantivy index.
//!
//! `ModelIndex` owns the index, reader and writer of one search model. Each
//! write is a single transaction: delete by `_id`, add, commit, reload the
//! reader. Searches run against the reader's snapshot of the last commit, so
//! a half-written entry is never visible.
//!
//! # Usage
//!
//! ```rust,ignore
//! use docket_search::ModelIndex;
//!
//! let index = ModelIndex::open_or_create(&path, &model, 50_000_000)?;
//! index.upsert("42", [("content", "invoice march".to_string())])?;
//! let (hits, total) = index.search("invoice", 10)?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use docket_core::{Error, Result, SearchModel};
use tantivy::collector::{Count, TopDocs};
use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::{
    Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, TantivyError, Term,
};

use crate::schema::ModelSchema;

/// Default index writer buffer size (50MB).
pub const DEFAULT_WRITER_MEMORY: usize = 50_000_000;

/// Tantivy index of one search model.
pub struct ModelIndex {
    type_tag: String,
    path: Option<PathBuf>,
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    schema: ModelSchema,
}

impl ModelIndex {
    /// Open the index at `path`, or create it when the directory holds none.
    ///
    /// An existing index is never rebuilt: unreadable metadata or a schema
    /// that lost model fields fails with [`Error::IndexCorruption`].
    pub fn open_or_create(path: &Path, model: &SearchModel, writer_memory: usize) -> Result<Self> {
        std::fs::create_dir_all(path).map_err(|e| Error::storage(path, e))?;

        let (index, schema) = if path.join("meta.json").exists() {
            let index = Index::open_in_dir(path)
                .map_err(|e| map_tantivy_error(e, path, "failed to open index"))?;
            let schema = ModelSchema::from_index(&index, model, path)?;
            log::debug!("Opened index for '{}' at {}", model.type_tag, path.display());
            (index, schema)
        } else {
            let schema = ModelSchema::build(model)?;
            let index = Index::create_in_dir(path, schema.schema().clone())
                .map_err(|e| map_tantivy_error(e, path, "failed to create index"))?;
            log::info!("Created index for '{}' at {}", model.type_tag, path.display());
            (index, schema)
        };

        Self::from_parts(model, Some(path.to_path_buf()), index, schema, writer_memory)
    }

    /// Create an in-memory index (for testing).
    pub fn in_memory(model: &SearchModel, writer_memory: usize) -> Result<Self> {
        let schema = ModelSchema::build(model)?;
        let index = Index::create_in_ram(schema.schema().clone());
        Self::from_parts(model, None, index, schema, writer_memory)
    }

    fn from_parts(
        model: &SearchModel,
        path: Option<PathBuf>,
        index: Index,
        schema: ModelSchema,
        writer_memory: usize,
    ) -> Result<Self> {
        ModelSchema::register_tokenizers(&index);
        let location = path.as_deref().unwrap_or(Path::new("<ram>"));

        let writer = index
            .writer(writer_memory)
            .map_err(|e| map_tantivy_error(e, location, "failed to create index writer"))?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| map_tantivy_error(e, location, "failed to open index reader"))?;

        Ok(Self {
            type_tag: model.type_tag.clone(),
            path,
            index,
            reader,
            writer: Mutex::new(writer),
            schema,
        })
    }

    /// Type tag this index belongs to.
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Index directory, `None` for in-memory indexes.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get the schema.
    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    /// Replace the entry of `id` with a document built from `values`.
    pub fn upsert<'a>(
        &self,
        id: &str,
        values: impl IntoIterator<Item = (&'a str, String)>,
    ) -> Result<()> {
        let doc = self.schema.document(id, values);
        self.write("index", |writer| {
            writer.delete_term(self.id_term(id));
            writer.add_document(doc)?;
            Ok(())
        })
    }

    /// Remove the entry of `id`. Absent entries are not an error.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.write("deindex", |writer| {
            writer.delete_term(self.id_term(id));
            Ok(())
        })
    }

    /// Remove every entry in one commit.
    pub fn clear(&self) -> Result<()> {
        self.write("clear", |writer| {
            writer.delete_all_documents()?;
            Ok(())
        })
    }

    /// Number of committed entries.
    pub fn count(&self) -> usize {
        usize::try_from(self.reader.searcher().num_docs()).unwrap_or(usize::MAX)
    }

    /// Run a query against the last committed state.
    ///
    /// Returns up to `limit` `(id, score)` pairs by descending score and the
    /// total number of matches.
    pub fn search(&self, text: &str, limit: usize) -> Result<(Vec<(String, f32)>, usize)> {
        let fields = self.schema.text_fields().iter().map(|f| f.field).collect();
        let mut parser = QueryParser::for_index(&self.index, fields);
        parser.set_conjunction_by_default();
        for text_field in self.schema.text_fields() {
            parser.set_field_boost(text_field.field, text_field.boost);
        }

        let query = parser
            .parse_query(text)
            .map_err(|e| Error::query_syntax(text, e.to_string()))?;

        let searcher = self.reader.searcher();
        let (top_docs, total) = searcher
            .search(&*query, &(TopDocs::with_limit(limit.max(1)), Count))
            .map_err(|e| map_tantivy_error(e, self.location(), "search failed"))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs.into_iter().take(limit) {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| map_tantivy_error(e, self.location(), "failed to load document"))?;
            if let Some(id) = doc.get_first(self.schema.id()).and_then(|v| v.as_str()) {
                hits.push((id.to_string(), score));
            }
        }
        Ok((hits, total))
    }

    /// Run staged operations and commit them as one transaction.
    ///
    /// The writer guard is held from staging until the reader has reloaded;
    /// a failed commit rolls the staged operations back.
    fn write<F>(&self, action: &str, stage: F) -> Result<()>
    where
        F: FnOnce(&mut IndexWriter) -> tantivy::Result<()>,
    {
        let mut writer = self.lock_writer()?;
        let outcome = stage(&mut writer).and_then(|()| writer.commit().map(|_| ()));
        if let Err(e) = outcome {
            if let Err(rollback) = writer.rollback() {
                log::warn!("{}: rollback after failed {action} failed: {rollback}", self.type_tag);
            }
            return Err(map_tantivy_error(e, self.location(), &format!("{action} failed")));
        }
        self.reader
            .reload()
            .map_err(|e| map_tantivy_error(e, self.location(), "failed to reload reader"))
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, IndexWriter>> {
        self.writer
            .lock()
            .map_err(|_| Error::operation(format!("index writer of '{}' poisoned", self.type_tag)))
    }

    fn id_term(&self, id: &str) -> Term {
        Term::from_field_text(self.schema.id(), id)
    }

    fn location(&self) -> &Path {
        self.path.as_deref().unwrap_or(Path::new("<ram>"))
    }
}

/// Classify a Tantivy error.
///
/// Unreadable or incompatible index data is corruption; I/O, lock and
/// directory failures mean the storage is unavailable.
pub(crate) fn map_tantivy_error(err: TantivyError, path: &Path, action: &str) -> Error {
    match &err {
        TantivyError::DataCorruption(_)
        | TantivyError::IncompatibleIndex(_)
        | TantivyError::SchemaError(_)
        | TantivyError::DeserializeError(_) => Error::corruption(path, format!("{action}: {err}")),
        TantivyError::IoError(_)
        | TantivyError::LockFailure(..)
        | TantivyError::OpenDirectoryError(_)
        | TantivyError::OpenReadError(_)
        | TantivyError::OpenWriteError(_) => Error::storage(path, format!("{action}: {err}")),
        _ => Error::operation(format!("{action}: {err}")),
    }
}

impl std::fmt::Debug for ModelIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelIndex")
            .field("type_tag", &self.type_tag)
            .field("path", &self.path)
            .field("index", &"<tantivy::Index>")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
