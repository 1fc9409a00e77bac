//! railsearch CLI: rank and render content suggestions from the terminal.
//!
//! Calls `railsearch-core` directly with no server overhead.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

use railsearch_core::catalog::{CatalogLoader, CatalogSource, FileCatalogSource};
use railsearch_core::fuzzy::rank_score;
use railsearch_core::render::{CapabilityRegistry, HtmlBuffer, RenderTarget, RendererChain};
use railsearch_core::suggest::SuggestionBuilder;
use railsearch_core::types::{BoostSet, SuggestConfig};
use railsearch_core::load_railsearch_config;

/// railsearch CLI: content suggestions from a records file or catalog endpoint.
#[derive(Parser)]
#[command(name = "rail", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,
}

/// Where the records come from. Falls back to `.railsearch.toml` in the current directory.
#[derive(clap::Args)]
struct SourceArgs {
    /// JSON records file
    #[arg(long, conflicts_with = "url")]
    records: Option<PathBuf>,

    /// Catalog endpoint URL (e.g. http://localhost:8432/api/contents)
    #[arg(long)]
    url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest catalog entries for a query (empty query lists trending entries)
    Suggest {
        /// Search query
        #[arg(default_value = "")]
        query: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Maximum number of suggestions
        #[arg(long)]
        limit: Option<usize>,

        /// Comma-separated labels to boost
        #[arg(long)]
        boost: Option<String>,

        /// Show scores
        #[arg(long)]
        scores: bool,

        /// Print the rendered rail markup instead of a list
        #[arg(long)]
        html: bool,
    },
    /// List the deduplicated catalog, most frequent first
    Catalog {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Score a single label against a query
    Score {
        query: String,
        label: String,
    },
}

fn resolve_source(args: &SourceArgs, config: &SuggestConfig) -> Arc<dyn CatalogSource> {
    if let Some(path) = &args.records {
        return Arc::new(FileCatalogSource::new(path));
    }
    if let Some(url) = args.url.as_ref().or(config.catalog_url.as_ref()) {
        return http_source(url);
    }
    if let Some(path) = &config.catalog_path {
        return Arc::new(FileCatalogSource::new(path));
    }
    error!("No catalog source: pass --records <file> or --url <endpoint>");
    std::process::exit(2);
}

#[cfg(feature = "http-source")]
fn http_source(url: &str) -> Arc<dyn CatalogSource> {
    match railsearch_core::catalog::HttpCatalogSource::new(url) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!(url, error = %e, "Could not set up HTTP client");
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "http-source"))]
fn http_source(_url: &str) -> Arc<dyn CatalogSource> {
    error!("This binary was built without the http-source feature; use --records");
    std::process::exit(2);
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("railsearch=warn".parse().unwrap())
                .add_directive("rail=warn".parse().unwrap()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = load_railsearch_config(&cwd);

    match cli.command {
        Commands::Suggest { query, source, limit, boost, scores, html } => {
            let loader = CatalogLoader::new(resolve_source(&source, &config));
            let catalog = loader.ensure_loaded().await;

            let limit = limit.unwrap_or(config.limit);
            let boost = boost.as_deref().map(BoostSet::from_csv).unwrap_or_default();
            let builder = SuggestionBuilder::from_config(&config);

            if html {
                let items = builder.build(&catalog, &query, &boost, limit);
                let registry = Arc::new(CapabilityRegistry::new());
                let chain = RendererChain::from_registry(&registry, config.renderer_hooks.as_slice());
                let mut rail = HtmlBuffer::new("contentSuggestRail");
                chain.render(&mut rail, &items);
                println!("{}", rail.markup());
                return;
            }

            let ranked = builder.rank(&catalog, &query, &boost, limit);
            if cli.json {
                let items: Vec<serde_json::Value> = ranked
                    .iter()
                    .map(|c| {
                        serde_json::json!({
                            "label": c.entry.label,
                            "count": c.entry.count,
                            "score": c.score,
                        })
                    })
                    .collect();
                println!("{}", to_json(&items));
            } else {
                if ranked.is_empty() {
                    eprintln!("No suggestions for '{query}'");
                    std::process::exit(1);
                }
                for c in &ranked {
                    if scores {
                        println!("{:<40} {:>6}  {:>4}", c.entry.label, c.entry.count, c.score);
                    } else {
                        println!("{:<40} {:>6}", c.entry.label, c.entry.count);
                    }
                }
                eprintln!("\n{} suggestions from {} entries", ranked.len(), catalog.len());
            }
        }
        Commands::Catalog { source } => {
            let loader = CatalogLoader::new(resolve_source(&source, &config));
            let catalog = loader.ensure_loaded().await;

            let mut entries = catalog.entries().to_vec();
            entries.sort_by(|a, b| b.count.cmp(&a.count));

            if cli.json {
                println!("{}", to_json(&entries));
            } else {
                if entries.is_empty() {
                    eprintln!("Catalog is empty (source: {})", loader.source_name());
                    std::process::exit(1);
                }
                for e in &entries {
                    println!("{:<40} {:>6}", e.label, e.count);
                }
                eprintln!("\n{} entries from {} records", entries.len(), catalog.record_count());
            }
        }
        Commands::Score { query, label } => {
            let score = rank_score(&query, &label);
            if cli.json {
                println!(
                    "{}",
                    to_json(&serde_json::json!({ "query": query, "label": label, "score": score }))
                );
            } else {
                println!("{score}");
            }
        }
    }
}
