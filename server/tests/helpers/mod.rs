//! Test harness for API integration tests.
//!
//! Builds an `AppContext` from a fixture records file and calls the Axum handlers
//! directly (no sockets, no HTTP client).

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use railsearch_core::catalog::{CatalogLoader, CatalogSource};
use railsearch_core::types::SuggestConfig;
use railsearch_server::open_records_file;
use railsearch_server::types::AppContext;
use serde_json::Value;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Context serving the named fixture records file with default config.
pub fn context_from_fixture(name: &str) -> AppContext {
    let path = fixture_path(name);
    assert!(path.exists(), "Fixture '{name}' not found at {}", path.display());
    let (body, source) = open_records_file(&path).expect("fixture should load");
    AppContext::new(Arc::new(CatalogLoader::new(source)), SuggestConfig::default(), Some(body))
}

/// Context over an arbitrary source, without a records document to serve.
pub fn context_from_source(source: Arc<dyn CatalogSource>) -> AppContext {
    AppContext::new(Arc::new(CatalogLoader::new(source)), SuggestConfig::default(), None)
}

pub async fn body_text(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

pub async fn body_json(resp: Response) -> Value {
    let text = body_text(resp).await;
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("invalid JSON ({e}): {text}"))
}
