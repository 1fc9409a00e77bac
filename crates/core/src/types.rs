//! Core types shared across railsearch: raw content records, the deduplicated catalog,
//! suggestion items handed to renderers, transient scored candidates, boost sets, and
//! the runtime configuration.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// One record as delivered by a catalog source. Only the `contents` text is used;
/// every other field of the source document is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(default, alias = "content")]
    pub contents: Option<String>,
}

impl ContentRecord {
    pub fn new(contents: impl Into<String>) -> Self {
        Self { contents: Some(contents.into()) }
    }

    /// A record without a usable content tag.
    pub fn empty() -> Self {
        Self { contents: None }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A distinct, trimmed, non-empty content tag and the number of records sharing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub label: String,
    pub count: usize,
}

impl CatalogEntry {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self { label: label.into(), count }
    }
}

/// Ordered, immutable set of catalog entries with unique labels.
///
/// Order is the order in which each label was first seen in the source records; it is the
/// tie-break order for every ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Deduplicate raw records into a catalog.
    ///
    /// Each `contents` value is trimmed; empty or missing values are dropped. Labels are
    /// compared exactly (case-sensitive) after trimming.
    pub fn from_records(records: &[ContentRecord]) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut entries: Vec<CatalogEntry> = Vec::new();

        for record in records {
            let label = match record.contents.as_deref().map(str::trim) {
                Some(l) if !l.is_empty() => l,
                _ => continue,
            };
            match index.get(label) {
                Some(&i) => entries[i].count += 1,
                None => {
                    index.insert(label, entries.len());
                    entries.push(CatalogEntry::new(label, 1));
                }
            }
        }

        Self { entries }
    }

    /// Build a catalog from already-deduplicated entries. Later duplicates of a label are
    /// dropped so the uniqueness invariant holds.
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut seen = HashSet::new();
        let entries = entries.into_iter().filter(|e| seen.insert(e.label.clone())).collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// Total number of records that contributed a label.
    pub fn record_count(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// Rendering-facing projection of a catalog entry. Renderers never see scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

impl SuggestionItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), subtitle: None }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// A catalog entry scored against one query. Lives only for a single evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredCandidate {
    pub entry: CatalogEntry,
    pub score: u32,
}

/// Labels that receive the boost bonus for one query call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoostSet {
    labels: HashSet<String>,
}

impl BoostSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>) -> bool {
        self.labels.insert(label.into())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Parse a comma-separated list, as accepted by the CLI and HTTP API.
    pub fn from_csv(csv: &str) -> Self {
        csv.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for BoostSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { labels: iter.into_iter().map(Into::into).collect() }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default number of suggestions shown in the rail.
pub const DEFAULT_LIMIT: usize = 8;

/// Bonus added to the similarity score of boosted labels.
pub const DEFAULT_BOOST: u32 = 50;

/// Default probe order for externally registered card renderers.
pub const DEFAULT_RENDERER_HOOKS: &[&str] =
    &["content_cards", "render_content_cards", "card_factory", "build_cards"];

/// Runtime configuration. Loaded from `.railsearch.toml` or defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestConfig {
    /// Maximum number of items in the rail.
    pub limit: usize,
    /// Score bonus for boosted labels.
    pub boost: u32,
    /// Attach a "N places" subtitle to each item.
    pub count_subtitle: bool,
    pub catalog_url: Option<String>,
    pub catalog_path: Option<PathBuf>,
    /// Names of registry hooks, probed in this order before the fallback renderer.
    pub renderer_hooks: Vec<String>,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            boost: DEFAULT_BOOST,
            count_subtitle: true,
            catalog_url: None,
            catalog_path: None,
            renderer_hooks: DEFAULT_RENDERER_HOOKS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
