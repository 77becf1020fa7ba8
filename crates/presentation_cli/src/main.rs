//! NCBI E-utilities CLI
//!
//! Search and fetch Entrez records through the rate-limited, cached request
//! pipeline, and manage the local response cache.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use application::{BatchService, EutilsPortExt, FetchOptions, ResponseCachePort, SearchOptions};
use clap::{Parser, Subcommand};
use domain::{Database, ResponseMode};
use infrastructure::{AppConfig, EutilsAdapter, LoggingConfig, SqliteResponseCache, init_logging};
use secrecy::SecretString;
use tracing::debug;

/// NCBI E-utilities client
#[derive(Debug, Parser)]
#[command(name = "eutils")]
#[command(author, version, about = "Rate-limited, cached NCBI E-utilities client", long_about = None)]
struct Cli {
    /// Verbosity level (overrides the configured log filter)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (default: ./eutils.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Contact email sent to NCBI
    #[arg(long, env = "NCBI_EMAIL", global = true)]
    email: Option<String>,

    /// NCBI API key
    #[arg(long, env = "NCBI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Cache database file
    #[arg(long, global = true)]
    cache_path: Option<String>,

    /// Bypass the response cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search a database and list matching identifiers
    ///
    /// Example: eutils search "crispr[Title] AND 2023[pdat]" --retmax 50
    Search {
        /// Entrez query
        term: String,

        /// Entrez database
        #[arg(long, default_value = "pubmed", value_parser = parse_database)]
        db: Database,

        /// Maximum number of identifiers to return
        #[arg(long, default_value_t = 20)]
        retmax: u32,

        /// Offset of the first identifier
        #[arg(long, default_value_t = 0)]
        retstart: u32,

        /// Sort order (e.g. relevance, pub_date)
        #[arg(long)]
        sort: Option<String>,

        /// Print the parsed result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch records by identifier, in chunks
    ///
    /// Example: eutils fetch 38000001,38000002 --rettype abstract --retmode text
    Fetch {
        /// Identifiers (comma or space separated)
        #[arg(value_delimiter = ',')]
        ids: Vec<String>,

        /// Read additional identifiers from a file, one per line
        #[arg(long)]
        ids_file: Option<PathBuf>,

        /// Entrez database
        #[arg(long, default_value = "pubmed", value_parser = parse_database)]
        db: Database,

        /// Record view (e.g. abstract, medline)
        #[arg(long)]
        rettype: Option<String>,

        /// Response mode: xml, json or text
        #[arg(long)]
        retmode: Option<ResponseMode>,

        /// Identifiers per request (default from configuration)
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Inspect or clean the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Debug, Subcommand)]
enum CacheAction {
    /// Show entry, hit and size statistics
    Stats,
    /// Delete entries older than the configured maximum age
    ClearStale,
    /// Delete every entry
    Clear,
}

fn parse_database(name: &str) -> Result<Database, String> {
    Database::new(name).map_err(|e| e.to_string())
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Load configuration and apply command-line overrides
fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    if let Some(email) = &cli.email {
        config.email = Some(email.clone());
    }
    if let Some(key) = &cli.api_key {
        config.api_key = Some(SecretString::from(key.clone()));
    }
    if let Some(path) = &cli.cache_path {
        config.cache.path = Some(path.clone());
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }
    if let Some(filter) = log_filter_from_verbosity(cli.verbose) {
        config.logging.filter = filter.to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }

    Ok(config)
}

/// Identifiers from arguments followed by those in `file`
fn collect_ids(ids: &[String], file: Option<&Path>) -> anyhow::Result<Vec<String>> {
    let mut all: Vec<String> = ids
        .iter()
        .flat_map(|arg| arg.split_whitespace())
        .map(ToString::to_string)
        .collect();

    if let Some(path) = file {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        all.extend(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(ToString::to_string),
        );
    }

    Ok(all)
}

async fn run_cache_action(config: &AppConfig, action: &CacheAction) -> anyhow::Result<()> {
    let path = config.cache.resolved_path();
    let cache = SqliteResponseCache::open(&path, config.cache.max_age())
        .with_context(|| format!("Failed to open cache at {path}"))?;

    match action {
        CacheAction::Stats => {
            let stats = cache.get_stats().await?;
            print!("{}", render::cache_stats(&stats, &path));
        },
        CacheAction::ClearStale => {
            let removed = cache.clear_stale().await?;
            println!(
                "Removed {removed} entr{} older than {} days",
                if removed == 1 { "y" } else { "ies" },
                config.cache.max_age_days
            );
        },
        CacheAction::Clear => {
            let removed = cache.clear_all().await?;
            println!(
                "Removed {removed} entr{}",
                if removed == 1 { "y" } else { "ies" }
            );
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_logging(&config.logging).or_else(|e| {
        eprintln!("warning: {e}, falling back to default logging");
        init_logging(&LoggingConfig::default())
    })?;
    debug!(?config, "Configuration loaded");

    match &cli.command {
        Commands::Search {
            term,
            db,
            retmax,
            retstart,
            sort,
            json,
        } => {
            let adapter = EutilsAdapter::from_config(&config)?;
            let options = SearchOptions {
                retmax: *retmax,
                retstart: *retstart,
                sort: sort.clone(),
                ..Default::default()
            };

            let result = adapter.search(db, term, &options).await?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render::search_summary(&result));
            }
        },

        Commands::Fetch {
            ids,
            ids_file,
            db,
            rettype,
            retmode,
            chunk_size,
        } => {
            let ids = collect_ids(ids, ids_file.as_deref())?;
            anyhow::ensure!(!ids.is_empty(), "no identifiers given");

            let adapter = EutilsAdapter::from_config(&config)?;
            let service = BatchService::new(Arc::new(adapter))
                .with_default_chunk_size(config.batch.chunk_size)?;
            let options = FetchOptions {
                rettype: rettype.clone(),
                response_mode: *retmode,
                ..Default::default()
            };

            let mut report = |done: usize, total: usize| {
                eprintln!("Fetched chunk {done}/{total}");
            };
            let chunk_size = chunk_size.unwrap_or_else(|| service.default_chunk_size());
            let results = service
                .fetch_batch(db, &ids, chunk_size, &options, Some(&mut report))
                .await?;

            for result in results {
                println!("{}", result.body.trim_end());
            }
        },

        Commands::Cache { action } => run_cache_action(&config, action).await?,
    }

    Ok(())
}
