//! Docket CLI
//!
//! Command-line administration of the Docket search index.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docket_search::{BackendRegistry, SearchService};

use crate::config::{CONFIG_ENV, DocketConfig};

/// Docket CLI - search index administration
#[derive(Parser, Debug)]
#[command(name = "docket")]
#[command(version, about = "Docket search index administration tool", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = CONFIG_ENV, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index the records of a JSON array file
    Index {
        /// File holding `[{"type": ..., "id": ..., "fields": {...}}, ...]`
        file: PathBuf,
    },
    /// Remove one object from the index
    Deindex {
        /// Type tag of the object
        type_tag: String,
        /// Object identifier
        id: String,
    },
    /// Search the index
    Search {
        /// Query text
        query: String,
        /// Restrict to a type (repeatable; default: every configured type)
        #[arg(short = 't', long = "type")]
        types: Vec<String>,
        /// Maximum hits to print
        #[arg(short, long)]
        limit: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every entry of a type
    Clear {
        /// Type tag to clear
        type_tag: String,
    },
    /// Show entry counts per type
    Stats,
    /// List runtime prerequisites of the configured backend
    Deps,
    /// Configuration operations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; `log` records from the library crates are bridged in
    let default_filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Command::Config {
        action: ConfigAction::Path,
    } = &args.command
    {
        return Ok(commands::cmd_config_path(args.config.as_deref())?);
    }

    let config_path = DocketConfig::resolve_path(args.config.as_deref())?;
    let config = DocketConfig::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    tracing::debug!(path = %config_path.display(), backend = %config.search.backend, "Loaded configuration");

    let models = Arc::new(config.model_registry()?);
    let service = SearchService::new(
        config.search.clone(),
        BackendRegistry::with_defaults(),
        models,
    );

    match args.command {
        Command::Index { file } => {
            commands::cmd_index(&service, &file).await?;
        }
        Command::Deindex { type_tag, id } => {
            commands::cmd_deindex(&service, &type_tag, &id).await?;
        }
        Command::Search {
            query,
            types,
            limit,
            json,
        } => {
            commands::cmd_search(&service, &query, &types, limit, json).await?;
        }
        Command::Clear { type_tag } => commands::cmd_clear(&service, &type_tag).await?,
        Command::Stats => {
            commands::cmd_stats(&service).await?;
        }
        Command::Deps => commands::cmd_deps(&service).await?,
        Command::Config { action } => match action {
            ConfigAction::Path => commands::cmd_config_path(Some(&config_path))?,
            ConfigAction::Show => commands::cmd_config_show(&config)?,
        },
    }
    Ok(())
}
