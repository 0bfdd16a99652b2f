//! In-process search backend.
//!
//! `MemorySearch` keeps one inverted index (token → object ids) per type in
//! memory. It needs no storage, which makes it a drop-in engine for small
//! deployments and for exercising call sites without touching disk.
//!
//! # Matching
//!
//! - Text is split on non-alphanumeric characters and lowercased
//! - Every query term must match (AND)
//! - Score is the sum, over query terms, of term frequency × field boost

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use docket_core::{Error, Indexable, Result, SearchModelRegistry};
use tokio::sync::RwLock;

use crate::backend::SearchBackend;
use crate::types::{BackendArguments, SearchHit, SearchQuery, SearchResults};

/// Registry key of this backend.
pub const BACKEND_NAME: &str = "memory";

/// Hits returned when neither the query nor the arguments set a limit.
const DEFAULT_PAGE_SIZE: usize = 100;

/// Weighted term frequencies of one indexed object.
#[derive(Debug, Default)]
struct Entry {
    terms: HashMap<String, f32>,
}

/// Inverted index of one type.
#[derive(Debug, Default)]
struct TypeTable {
    entries: HashMap<String, Entry>,
    postings: HashMap<String, HashSet<String>>,
}

impl TypeTable {
    fn remove(&mut self, id: &str) -> bool {
        let Some(entry) = self.entries.remove(id) else {
            return false;
        };
        for term in entry.terms.keys() {
            if let Some(ids) = self.postings.get_mut(term) {
                ids.remove(id);
                if ids.is_empty() {
                    self.postings.remove(term);
                }
            }
        }
        true
    }

    fn insert(&mut self, id: String, entry: Entry) {
        for term in entry.terms.keys() {
            self.postings
                .entry(term.clone())
                .or_default()
                .insert(id.clone());
        }
        self.entries.insert(id, entry);
    }

    fn matches(&self, terms: &[String]) -> Vec<(&str, f32)> {
        let Some((first, rest)) = terms.split_first() else {
            return Vec::new();
        };
        let Some(candidates) = self.postings.get(first) else {
            return Vec::new();
        };

        candidates
            .iter()
            .filter(|id| {
                rest.iter()
                    .all(|term| self.postings.get(term).is_some_and(|ids| ids.contains(*id)))
            })
            .filter_map(|id| {
                let entry = self.entries.get(id)?;
                let score = terms
                    .iter()
                    .filter_map(|term| entry.terms.get(term))
                    .sum::<f32>();
                Some((id.as_str(), score))
            })
            .collect()
    }
}

/// In-memory inverted index backend.
pub struct MemorySearch {
    models: Arc<SearchModelRegistry>,
    page_size: usize,
    tables: RwLock<HashMap<String, TypeTable>>,
}

impl MemorySearch {
    /// Create the backend.
    ///
    /// Recognized arguments: `page_size` (default 100). Other arguments,
    /// including `index_path`, are ignored.
    pub fn new(args: &BackendArguments, models: Arc<SearchModelRegistry>) -> Result<Self> {
        let page_size = args.usize("page_size")?.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(Error::config("argument 'page_size' must be at least 1"));
        }
        Ok(Self {
            models,
            page_size,
            tables: RwLock::new(HashMap::new()),
        })
    }

    fn build_entry(&self, object: &dyn Indexable) -> Result<Entry> {
        let model = self.models.get(object.type_tag())?;
        let mut entry = Entry::default();
        for (field, value) in model.extract(object) {
            for token in tokenize(&value) {
                *entry.terms.entry(token).or_insert(0.0) += field.boost;
            }
        }
        Ok(entry)
    }
}

/// Split text into lowercase alphanumeric tokens.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Turn query text into search terms.
fn parse_query(text: &str) -> Result<Vec<String>> {
    if text.chars().filter(|c| *c == '"').count() % 2 != 0 {
        return Err(Error::query_syntax(text, "unbalanced double quote"));
    }
    let mut terms = tokenize(text);
    terms.sort();
    terms.dedup();
    Ok(terms)
}

#[async_trait]
impl SearchBackend for MemorySearch {
    async fn index_instance(&self, object: &dyn Indexable) -> Result<()> {
        let entry = self.build_entry(object)?;
        let id = object.object_id();

        let mut tables = self.tables.write().await;
        let table = tables.entry(object.type_tag().to_string()).or_default();
        table.remove(&id);
        log::debug!(
            "memory: indexed {}:{} ({} terms)",
            object.type_tag(),
            id,
            entry.terms.len()
        );
        table.insert(id, entry);
        Ok(())
    }

    async fn deindex_instance(&self, object: &dyn Indexable) -> Result<()> {
        self.models.get(object.type_tag())?;
        let id = object.object_id();

        let mut tables = self.tables.write().await;
        let removed = tables
            .get_mut(object.type_tag())
            .is_some_and(|table| table.remove(&id));
        log::debug!(
            "memory: deindexed {}:{} (present: {removed})",
            object.type_tag(),
            id
        );
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        let terms = parse_query(&query.text)?;
        let type_tags = query.distinct_type_tags();
        for type_tag in &type_tags {
            self.models.get(type_tag)?;
        }
        if terms.is_empty() {
            return Ok(SearchResults::empty(self.name()));
        }

        let tables = self.tables.read().await;
        let hits: Vec<SearchHit> = type_tags
            .into_iter()
            .filter_map(|type_tag| tables.get(type_tag).map(|table| (type_tag, table)))
            .flat_map(|(type_tag, table)| {
                table
                    .matches(&terms)
                    .into_iter()
                    .map(move |(id, score)| SearchHit::new(type_tag, id, score))
            })
            .collect();

        let total = hits.len();
        Ok(SearchResults::ranked(
            self.name(),
            hits,
            total,
            query.effective_limit(self.page_size),
        ))
    }

    async fn document_count(&self, type_tag: &str) -> Result<usize> {
        self.models.get(type_tag)?;
        let tables = self.tables.read().await;
        Ok(tables.get(type_tag).map_or(0, |table| table.entries.len()))
    }

    async fn clear(&self, type_tag: &str) -> Result<()> {
        self.models.get(type_tag)?;
        self.tables.write().await.remove(type_tag);
        log::info!("memory: cleared index for '{type_tag}'");
        Ok(())
    }

    fn name(&self) -> &str {
        BACKEND_NAME
    }
}

impl std::fmt::Debug for MemorySearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySearch")
            .field("page_size", &self.page_size)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
