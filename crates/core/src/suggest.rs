//! Turns the catalog and a query into the ordered, size-bounded suggestion list.
//!
//! With a non-empty query every entry is scored with [`rank_score`] plus the boost bonus,
//! zero scores are dropped, and the rest are sorted by score (catalog order on ties).
//! With an empty query similarity is meaningless, so the rail shows "trending" entries by
//! record count, catalog order on ties. Boosted labels are guaranteed a slot but do not
//! jump the count order.

use rayon::prelude::*;
use std::cmp::Reverse;

use crate::fuzzy::rank_score;
use crate::types::{BoostSet, Catalog, ScoredCandidate, SuggestConfig, SuggestionItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionBuilder {
    boost: u32,
    count_subtitle: bool,
}

impl Default for SuggestionBuilder {
    fn default() -> Self {
        Self::from_config(&SuggestConfig::default())
    }
}

impl SuggestionBuilder {
    pub fn new(boost: u32, count_subtitle: bool) -> Self {
        Self { boost, count_subtitle }
    }

    pub fn from_config(config: &SuggestConfig) -> Self {
        Self::new(config.boost, config.count_subtitle)
    }

    pub fn boost(&self) -> u32 {
        self.boost
    }

    /// Scored candidates for `query`, best first, at most `limit` of them.
    pub fn rank(
        &self,
        catalog: &Catalog,
        query: &str,
        boost: &BoostSet,
        limit: usize,
    ) -> Vec<ScoredCandidate> {
        if catalog.is_empty() || limit == 0 {
            return Vec::new();
        }
        // Whitespace only decides emptiness; non-empty queries are scored as typed.
        if query.trim().is_empty() {
            return trending(catalog, boost, self.boost, limit);
        }

        let mut scored: Vec<(usize, u32)> = catalog
            .entries()
            .par_iter()
            .enumerate()
            .filter_map(|(i, entry)| {
                let bonus = if boost.contains(&entry.label) { self.boost } else { 0 };
                let score = rank_score(query, &entry.label).saturating_add(bonus);
                (score > 0).then_some((i, score))
            })
            .collect();

        scored.sort_by_key(|&(i, score)| (Reverse(score), i));
        scored.truncate(limit);

        let entries = catalog.entries();
        scored
            .into_iter()
            .map(|(i, score)| ScoredCandidate { entry: entries[i].clone(), score })
            .collect()
    }

    /// Renderer-facing suggestions for `query`. Empty when the catalog is empty or nothing
    /// matches; never an error.
    pub fn build(
        &self,
        catalog: &Catalog,
        query: &str,
        boost: &BoostSet,
        limit: usize,
    ) -> Vec<SuggestionItem> {
        self.rank(catalog, query, boost, limit).into_iter().map(|c| self.build_item(c)).collect()
    }

    /// Project one candidate into a suggestion item, dropping its score.
    pub fn build_item(&self, candidate: ScoredCandidate) -> SuggestionItem {
        let item = SuggestionItem::new(candidate.entry.label);
        if self.count_subtitle {
            item.with_subtitle(count_subtitle(candidate.entry.count))
        } else {
            item
        }
    }
}

/// Empty-query ordering. Boosted entries claim slots first, then the rest fill up by count;
/// the chosen entries are listed by count descending. The score of a trending candidate is
/// its boost bonus, so callers showing scores can still tell boosted entries apart.
fn trending(catalog: &Catalog, boost: &BoostSet, bonus: u32, limit: usize) -> Vec<ScoredCandidate> {
    let entries = catalog.entries();
    let by_count = |&i: &usize| (Reverse(entries[i].count), i);

    let mut picked: Vec<usize> = (0..entries.len()).collect();
    picked.sort_by_key(|&i| (!boost.contains(&entries[i].label), by_count(&i)));
    picked.truncate(limit);
    picked.sort_by_key(by_count);

    picked
        .into_iter()
        .map(|i| ScoredCandidate {
            entry: entries[i].clone(),
            score: if boost.contains(&entries[i].label) { bonus } else { 0 },
        })
        .collect()
}

/// Human-readable annotation for how many records share a tag.
pub fn count_subtitle(count: usize) -> String {
    match count {
        1 => "1 place".to_string(),
        n => format!("{n} places"),
    }
}
