//! railsearch server: content catalog endpoint and suggestion API.
//!
//! # Modules
//!
//! - [`api`]: HTTP API handlers
//! - [`types`]: Axum state and the startup JSON cache

pub mod api;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use axum::{routing::get, Router};
use tracing::info;

use railsearch_core::catalog::{decode_records, CatalogSource, FileCatalogSource};
use railsearch_core::load_railsearch_config;
use railsearch_core::types::SuggestConfig;

use api::*;
use types::AppContext;

/// Build the API router (without transport layers).
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(api_health))
        .route("/api/contents", get(api_contents))
        .route("/api/catalog", get(api_catalog))
        .route("/api/suggest", get(api_suggest))
        .with_state(ctx)
}

/// Read and validate a records file, returning its text for `/api/contents` and a
/// source that re-reads it for the catalog.
pub fn open_records_file(path: &Path) -> Result<(String, Arc<dyn CatalogSource>), String> {
    let body = std::fs::read_to_string(path)
        .map_err(|e| format!("Could not read {}: {e}", path.display()))?;
    let records = decode_records(body.as_bytes())
        .map_err(|e| format!("Invalid records file {}: {e}", path.display()))?;
    info!(path = %path.display(), records = records.len(), "Records file opened");
    Ok((body, Arc::new(FileCatalogSource::new(path))))
}

/// Load `.railsearch.toml` from `root` and apply command-line overrides.
pub fn resolve_config(root: &Path, limit: Option<usize>) -> SuggestConfig {
    let mut config = load_railsearch_config(root);
    if let Some(limit) = limit {
        config.limit = limit;
    }
    config
}
