//! Tag and query token normalization.
//!
//! Two sides, two rules: entity-side candidates are taken verbatim (one
//! attribute value = one tag, no splitting), query text is split on
//! whitespace. Both drop blank values and deduplicate while keeping
//! first-seen order.

use itertools::Itertools;

/// Normalize entity-side tag candidates.
pub fn normalize_tags<I, S>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    candidates
        .into_iter()
        .map(Into::into)
        .filter(|s| !s.trim().is_empty())
        .unique()
        .collect()
}

/// Tokenize free-form query text: whitespace split, blank-filtered, deduped.
pub fn parse_query(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .unique()
        .collect()
}
