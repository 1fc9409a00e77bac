//! railsearch core: in-page content suggestions.
//!
//! Given a free-text query, ranks a once-loaded catalog of content tags and renders the
//! best matches into a suggestion rail, preferring a host-registered card renderer and
//! falling back to built-in markup.
//!
//! # Modules
//!
//! - [`types`]: Records, catalog, suggestion items, boost sets, configuration
//! - [`catalog`]: Catalog sources and the load-once, fail-open loader
//! - [`fuzzy`]: Tiered similarity scoring
//! - [`suggest`]: Query → ordered, bounded suggestion list
//! - [`render`]: Capability-probing renderer chain with fallback
//! - [`panel`]: Open/closed search panel controller
//! - [`error`]: Catalog load errors

pub mod catalog;
pub mod error;
pub mod fuzzy;
pub mod panel;
pub mod render;
pub mod suggest;
pub mod types;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use types::SuggestConfig;

// ---------------------------------------------------------------------------
// .railsearch.toml config loading
// ---------------------------------------------------------------------------

/// Name of the per-project config file.
pub const CONFIG_FILE: &str = ".railsearch.toml";

/// Known keys in `.railsearch.toml` for config validation.
const KNOWN_CONFIG_KEYS: &[&str] =
    &["limit", "boost", "count_subtitle", "catalog_url", "catalog_path", "renderer_hooks"];

/// Simple Levenshtein edit distance for typo suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Load configuration from `.railsearch.toml` in `root`.
///
/// Returns defaults merged with any overrides from the file. A missing or unparsable file
/// yields defaults (with a warning for the latter). Unknown keys trigger a warning with a
/// typo suggestion. A relative `catalog_path` is resolved against `root`.
pub fn load_railsearch_config(root: &Path) -> SuggestConfig {
    let path = root.join(CONFIG_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return SuggestConfig::default(),
    };
    debug!(path = %path.display(), "Loading config");
    parse_railsearch_config(&content, root)
}

/// Parse the contents of a config file; see [`load_railsearch_config`].
pub fn parse_railsearch_config(content: &str, root: &Path) -> SuggestConfig {
    let mut config = SuggestConfig::default();

    let table = match content.parse::<toml::Table>() {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "Failed to parse {CONFIG_FILE}");
            return config;
        }
    };

    // Validate keys, warn on unknown
    for key in table.keys() {
        if KNOWN_CONFIG_KEYS.contains(&key.as_str()) {
            continue;
        }
        let nearest = KNOWN_CONFIG_KEYS.iter().min_by_key(|k| edit_distance(key, k));
        match nearest {
            Some(suggestion) if edit_distance(key, suggestion) <= 3 => warn!(
                key = key.as_str(),
                suggestion = *suggestion,
                "Unknown key in {CONFIG_FILE}; did you mean '{suggestion}'?"
            ),
            _ => warn!(
                key = key.as_str(),
                "Unknown key in {CONFIG_FILE} (known keys: {})",
                KNOWN_CONFIG_KEYS.join(", ")
            ),
        }
    }

    if let Some(limit) = table.get("limit").and_then(|v| v.as_integer()) {
        match usize::try_from(limit) {
            Ok(l) => config.limit = l,
            Err(_) => warn!(limit, "Ignoring negative limit"),
        }
    }

    if let Some(boost) = table.get("boost").and_then(|v| v.as_integer()) {
        match u32::try_from(boost) {
            Ok(b) => config.boost = b,
            Err(_) => warn!(boost, "Ignoring out-of-range boost"),
        }
    }

    if let Some(flag) = table.get("count_subtitle").and_then(|v| v.as_bool()) {
        config.count_subtitle = flag;
    }

    if let Some(url) = table.get("catalog_url").and_then(|v| v.as_str()) {
        config.catalog_url = Some(url.to_string());
    }

    if let Some(p) = table.get("catalog_path").and_then(|v| v.as_str()) {
        let p = PathBuf::from(p);
        config.catalog_path = Some(if p.is_relative() { root.join(p) } else { p });
    }

    // renderer_hooks replaces the default order
    if let Some(hooks) = table.get("renderer_hooks").and_then(|v| v.as_array()) {
        config.renderer_hooks =
            hooks.iter().filter_map(|v| v.as_str().map(|s| s.to_string())).collect();
    }

    config
}
