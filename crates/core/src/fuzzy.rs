//! Tiered similarity scoring of a query against a catalog label.
//!
//! Tiers, compared case-insensitively:
//!
//! | match                         | score |
//! |-------------------------------|-------|
//! | exact                         | 100   |
//! | label starts with query       | 80    |
//! | label contains query          | 60    |
//! | otherwise                     | length of the longest run of the query found in the label |
//!
//! The last tier checks substrings of the query against the label directly, which is
//! O(q²) containment tests per label. That is fine for catalogs of a few hundred tags; a
//! larger catalog would need an n-gram index that keeps these exact scores.

// ---------------------------------------------------------------------------
// Scoring constants
// ---------------------------------------------------------------------------

pub const SCORE_EXACT: u32 = 100;
pub const SCORE_PREFIX: u32 = 80;
pub const SCORE_CONTAINS: u32 = 60;

/// Score `label` against `query`. Empty input on either side scores 0.
pub fn rank_score(query: &str, label: &str) -> u32 {
    let q = query.to_lowercase();
    let l = label.to_lowercase();
    if q.is_empty() || l.is_empty() {
        return 0;
    }
    if l == q {
        return SCORE_EXACT;
    }
    if l.starts_with(&q) {
        return SCORE_PREFIX;
    }
    if l.contains(&q) {
        return SCORE_CONTAINS;
    }
    longest_shared_run(&q, &l) as u32
}

/// Length in characters of the longest contiguous substring of `query` that occurs
/// anywhere in `label`. Both inputs are taken as-is (callers lowercase first).
pub fn longest_shared_run(query: &str, label: &str) -> usize {
    // Byte offset of every char boundary, so substrings are sliced by character.
    let bounds: Vec<usize> =
        query.char_indices().map(|(i, _)| i).chain(std::iter::once(query.len())).collect();
    let chars = bounds.len() - 1;

    let mut best = 0;
    for start in 0..chars {
        if chars - start <= best {
            break;
        }
        for end in (start + best + 1)..=chars {
            // Extending a substring that is already absent cannot make it present.
            if !label.contains(&query[bounds[start]..bounds[end]]) {
                break;
            }
            best = end - start;
        }
    }
    best
}
