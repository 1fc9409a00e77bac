//! Catalog loading: pluggable record sources and a load-once, fail-open loader.
//!
//! The loader fetches at most once per lifetime. Concurrent callers wait on the same
//! in-flight fetch, and readers only ever see "not loaded yet" (empty) or the complete
//! catalog, never a partially built one.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::error::{CatalogError, Result};
use crate::types::{Catalog, ContentRecord};

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Anything that can produce the raw content records.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_records(&self) -> Result<Vec<ContentRecord>>;
}

/// Decode a records document.
///
/// Accepts a JSON array of objects. A `null` document is an empty list. The text field
/// is `contents` (or `content`); a missing or non-string value becomes an empty record,
/// which deduplication discards.
pub fn decode_records(body: &[u8]) -> Result<Vec<ContentRecord>> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| CatalogError::Decode(e.to_string()))?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.iter().map(record_from_value).collect()),
        other => Err(CatalogError::Decode(format!(
            "expected an array of records, got {}",
            json_kind(&other)
        ))),
    }
}

fn record_from_value(v: &Value) -> ContentRecord {
    let text = v
        .get("contents")
        .or_else(|| v.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string);
    ContentRecord { contents: text }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Records held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogSource {
    records: Vec<ContentRecord>,
}

impl StaticCatalogSource {
    pub fn new(records: Vec<ContentRecord>) -> Self {
        Self { records }
    }

    /// Convenience constructor from bare content strings.
    pub fn from_contents<I, S>(contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { records: contents.into_iter().map(ContentRecord::new).collect() }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_records(&self) -> Result<Vec<ContentRecord>> {
        Ok(self.records.clone())
    }
}

/// Records read from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    path: PathBuf,
    name: String,
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_records(&self) -> Result<Vec<ContentRecord>> {
        let bytes = tokio::fs::read(&self.path).await?;
        decode_records(&bytes)
    }
}

/// Path the catalog endpoint is conventionally served under.
pub const DEFAULT_CATALOG_PATH: &str = "/api/contents";

/// Records fetched over HTTP with a single GET; no retries.
#[cfg(feature = "http-source")]
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: reqwest::Client,
    url: String,
}

#[cfg(feature = "http-source")]
impl HttpCatalogSource {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("railsearch/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| CatalogError::Fetch(e.to_string()))?;
        Ok(Self { client, url: url.into() })
    }

    /// Point at the conventional catalog path of a base URL, e.g. `http://host:8432`.
    pub fn for_base(base: &str) -> Result<Self> {
        Self::new(format!("{}{}", base.trim_end_matches('/'), DEFAULT_CATALOG_PATH))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(feature = "http-source")]
#[async_trait]
impl CatalogSource for HttpCatalogSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch_records(&self) -> Result<Vec<ContentRecord>> {
        let resp =
            self.client.get(&self.url).send().await.map_err(|e| CatalogError::Fetch(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }
        let body = resp.bytes().await.map_err(|e| CatalogError::Fetch(e.to_string()))?;
        decode_records(&body)
    }
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Loads the catalog once and caches it for the loader's lifetime.
///
/// There is no refresh: a new catalog requires a new loader.
pub struct CatalogLoader {
    source: Arc<dyn CatalogSource>,
    catalog: OnceCell<Arc<Catalog>>,
    fetches: AtomicUsize,
}

impl CatalogLoader {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source, catalog: OnceCell::new(), fetches: AtomicUsize::new(0) }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Make sure the catalog is present, fetching it on the first call.
    ///
    /// Always resolves. A failed fetch leaves an empty catalog behind and is not retried.
    pub async fn ensure_loaded(&self) -> Arc<Catalog> {
        if let Some(catalog) = self.catalog.get() {
            debug!(source = self.source.name(), "Catalog already loaded");
            return Arc::clone(catalog);
        }
        let catalog = self.catalog.get_or_init(|| self.load()).await;
        Arc::clone(catalog)
    }

    async fn load(&self) -> Arc<Catalog> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let start = Instant::now();
        match self.source.fetch_records().await {
            Ok(records) => {
                let catalog = Catalog::from_records(&records);
                info!(
                    source = self.source.name(),
                    records = records.len(),
                    entries = catalog.len(),
                    time_ms = start.elapsed().as_millis() as u64,
                    "Catalog loaded"
                );
                Arc::new(catalog)
            }
            Err(e) => {
                error!(source = self.source.name(), error = %e, "Failed to load catalog");
                Arc::new(Catalog::default())
            }
        }
    }

    /// The loaded catalog, or an empty one while the load has not completed.
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.catalog.get().cloned().unwrap_or_default()
    }

    pub fn is_loaded(&self) -> bool {
        self.catalog.initialized()
    }

    /// Number of fetches issued so far (0 or 1).
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for CatalogLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogLoader")
            .field("source", &self.source.name())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
