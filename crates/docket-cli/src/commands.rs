//! Handler functions for `docket` subcommands.

use std::path::Path;

use docket_core::{Error, IndexableRecord, Result};
use docket_search::{SearchQuery, SearchService};

use crate::config::DocketConfig;

// ============================================================================
// Index maintenance
// ============================================================================

/// Index every record of a JSON array file.
///
/// Stops at the first failing record; earlier records stay indexed.
pub async fn cmd_index(service: &SearchService, file: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(file).map_err(|e| Error::io_with_path(e, file))?;
    let records: Vec<IndexableRecord> = serde_json::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", file.display())))?;

    for record in &records {
        service.index_instance(record).await?;
    }
    println!("Indexed {} objects from {}", records.len(), file.display());
    Ok(records.len())
}

/// Remove one object from the index.
pub async fn cmd_deindex(service: &SearchService, type_tag: &str, id: &str) -> Result<()> {
    service
        .deindex_instance(&IndexableRecord::new(type_tag, id))
        .await?;
    println!("Deindexed {type_tag}:{id}");
    Ok(())
}

/// Remove every entry of a type.
pub async fn cmd_clear(service: &SearchService, type_tag: &str) -> Result<()> {
    service.clear(type_tag).await?;
    println!("Cleared index for '{type_tag}'");
    Ok(())
}

// ============================================================================
// Queries
// ============================================================================

/// Run a search and print the hits.
///
/// With no type given, every configured type is searched.
pub async fn cmd_search(
    service: &SearchService,
    text: &str,
    types: &[String],
    limit: Option<usize>,
    json: bool,
) -> Result<usize> {
    let type_tags: Vec<String> = if types.is_empty() {
        service
            .models()
            .type_tags()
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        types.to_vec()
    };

    let mut query = SearchQuery::new(type_tags, text);
    if let Some(limit) = limit {
        query = query.with_limit(limit);
    }
    let results = service.search(&query).await?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&results).map_err(|e| Error::operation(e.to_string()))?;
        println!("{rendered}");
    } else {
        for hit in &results.hits {
            println!("{:>8.3}  {}:{}", hit.score, hit.type_tag, hit.id);
        }
        println!(
            "{} of {} matches ({})",
            results.hits.len(),
            results.total,
            results.backend
        );
    }
    Ok(results.hits.len())
}

/// Print the entry count of every configured type.
pub async fn cmd_stats(service: &SearchService) -> Result<Vec<(String, usize)>> {
    let mut counts = Vec::new();
    for model in service.models().iter() {
        let count = service.document_count(&model.type_tag).await?;
        println!("{:<20} {count:>8}  {}", model.type_tag, model.label);
        counts.push((model.type_tag.clone(), count));
    }
    Ok(counts)
}

/// List the backend's runtime prerequisites and their status.
pub async fn cmd_deps(service: &SearchService) -> Result<()> {
    let dependencies = service.dependencies().await?;
    if dependencies.is_empty() {
        println!("No runtime dependencies declared");
    }
    for dependency in dependencies {
        println!("[{}] {dependency}", dependency.check());
        if let Some(help) = &dependency.help_text {
            println!("    {help}");
        }
    }
    Ok(())
}

// ============================================================================
// Configuration
// ============================================================================

/// Show the resolved config file path.
pub fn cmd_config_path(explicit: Option<&Path>) -> Result<()> {
    let path = DocketConfig::resolve_path(explicit)?;
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(file does not exist)");
    }
    Ok(())
}

/// Print the effective configuration as TOML.
pub fn cmd_config_show(config: &DocketConfig) -> Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
