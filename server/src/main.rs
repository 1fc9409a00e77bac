//! railsearch binary: thin CLI shell over the [`railsearch_server`] library crate.

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use railsearch_core::catalog::{CatalogLoader, CatalogSource};
use railsearch_server::types::AppContext;
use railsearch_server::{build_router, open_records_file, resolve_config};

// ---------------------------------------------------------------------------
// CLI definition (clap derive)
// ---------------------------------------------------------------------------

/// Content catalog endpoint and suggestion API.
#[derive(Parser)]
#[command(name = "railsearch", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Project root holding .railsearch.toml (default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// JSON records file to serve and index
    #[arg(long, conflicts_with = "catalog_url")]
    records: Option<PathBuf>,

    /// Index records from another catalog endpoint instead of a file
    #[arg(long)]
    catalog_url: Option<String>,

    /// Default number of suggestions per query
    #[arg(long)]
    limit: Option<usize>,

    /// Bind to 0.0.0.0 instead of 127.0.0.1 (localhost)
    #[arg(long)]
    bind_all: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Graceful shutdown signal
// ---------------------------------------------------------------------------

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received SIGINT, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                error!(error = %e, "Could not register SIGTERM handler");
                let _ = ctrl_c.await;
                info!("Received SIGINT, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("Received Ctrl+C, shutting down...");
    }
}

#[cfg(feature = "http-source")]
fn http_source(url: &str) -> Arc<dyn CatalogSource> {
    match railsearch_core::catalog::HttpCatalogSource::new(url) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!(url, error = %e, "Could not set up catalog client");
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "http-source"))]
fn http_source(url: &str) -> Arc<dyn CatalogSource> {
    error!(url, "Built without the http-source feature; use --records");
    std::process::exit(1);
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("railsearch=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "railsearch", &mut std::io::stdout());
        return;
    }

    let root = cli
        .root
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let config = resolve_config(&root, cli.limit);

    // ---------------------------------------------------------------------------
    // Catalog source: --records, --catalog-url, then .railsearch.toml
    // ---------------------------------------------------------------------------

    let records_path = cli.records.clone().or_else(|| {
        if cli.catalog_url.is_none() {
            config.catalog_path.clone()
        } else {
            None
        }
    });

    let (contents_json, source): (Option<String>, Arc<dyn CatalogSource>) =
        if let Some(path) = records_path {
            match open_records_file(&path) {
                Ok((body, source)) => (Some(body), source),
                Err(e) => {
                    error!("{e}");
                    std::process::exit(1);
                }
            }
        } else if let Some(url) = cli.catalog_url.as_ref().or(config.catalog_url.as_ref()) {
            (None, http_source(url))
        } else {
            error!("No catalog source. Pass --records <file> or --catalog-url <url>");
            std::process::exit(1);
        };

    let loader = Arc::new(CatalogLoader::new(source));
    info!(source = loader.source_name(), limit = config.limit, "Catalog source configured");

    // Warm the catalog in the background; requests wait on the same load.
    {
        let loader = Arc::clone(&loader);
        tokio::spawn(async move {
            loader.ensure_loaded().await;
        });
    }

    let ctx = AppContext::new(loader, config, contents_json);

    // Bind address: 127.0.0.1 by default, --bind-all for 0.0.0.0
    let bind_addr = if cli.bind_all { "0.0.0.0" } else { "127.0.0.1" };

    let explicit_port: Option<u16> = std::env::var("PORT").ok().and_then(|p| p.parse().ok());

    let listener = if let Some(port) = explicit_port {
        tokio::net::TcpListener::bind(format!("{bind_addr}:{port}")).await.unwrap_or_else(|e| {
            error!(port = port, error = %e, "Could not bind to port");
            eprintln!("  PORT={port} was set explicitly. Choose a different port.");
            std::process::exit(1);
        })
    } else {
        // Auto-scan: try 8432..=8441
        const BASE: u16 = 8432;
        const RANGE: u16 = 10;
        let mut found = None;
        for port in BASE..BASE + RANGE {
            if let Ok(l) = tokio::net::TcpListener::bind(format!("{bind_addr}:{port}")).await {
                found = Some(l);
                break;
            }
        }
        found.unwrap_or_else(|| {
            error!(range_start = BASE, range_end = BASE + RANGE - 1, "No free port found");
            eprintln!("  Try: PORT=<port> railsearch");
            std::process::exit(1);
        })
    };

    let port = match listener.local_addr() {
        Ok(addr) => addr.port(),
        Err(e) => {
            error!(error = %e, "Could not read bound address");
            std::process::exit(1);
        }
    };

    let app = build_router(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive());

    info!(port = port, "http://localhost:{port}");
    // Machine-readable line for scripts (not through tracing)
    eprintln!("RAILSEARCH_PORT={port}");

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
