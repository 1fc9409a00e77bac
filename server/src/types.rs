//! Shared server types: the pre-serialized records document and the Axum state.

use std::sync::Arc;
use std::time::Instant;

use railsearch_core::catalog::CatalogLoader;
use railsearch_core::render::{CapabilityRegistry, RendererChain};
use railsearch_core::suggest::SuggestionBuilder;
use railsearch_core::types::SuggestConfig;

/// Upper bound on `limit` accepted by the suggestion endpoint.
pub const MAX_SUGGEST_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// HTTP-specific types (pre-computed JSON cache + Axum state)
// ---------------------------------------------------------------------------

/// Responses computed once at startup.
pub struct HttpCache {
    /// The raw records document served at `/api/contents`, when the server owns the
    /// records file. `None` when the catalog comes from another endpoint.
    pub contents_json: Option<String>,
}

/// Axum application state.
#[derive(Clone)]
pub struct AppContext {
    pub loader: Arc<CatalogLoader>,
    pub builder: SuggestionBuilder,
    /// Render hooks available to server-side rendering, probed in `config.renderer_hooks` order.
    pub registry: Arc<CapabilityRegistry>,
    pub renderers: Arc<RendererChain>,
    pub config: Arc<SuggestConfig>,
    pub cache: Arc<HttpCache>,
    pub start_time: Instant,
}

impl AppContext {
    pub fn new(loader: Arc<CatalogLoader>, config: SuggestConfig, contents_json: Option<String>) -> Self {
        let registry = Arc::new(CapabilityRegistry::new());
        let renderers =
            Arc::new(RendererChain::from_registry(&registry, config.renderer_hooks.as_slice()));
        Self {
            loader,
            builder: SuggestionBuilder::from_config(&config),
            registry,
            renderers,
            config: Arc::new(config),
            cache: Arc::new(HttpCache { contents_json }),
            start_time: Instant::now(),
        }
    }
}
