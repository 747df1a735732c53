//! Merged search results grouped by search-type label.

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::model::types::SearchHit;

/// Search hits from one or more entity types, grouped by each hit's
/// search-type label.
///
/// Group order is the first-seen insertion order of labels; order within a
/// group follows the order hits were pushed (i.e. underlying query order).
#[derive(Debug, Default)]
pub struct SearchResults {
    groups: Vec<(String, Vec<SearchHit>)>,
}

impl SearchResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hit to its label's group, creating the group on first sight.
    pub fn push(&mut self, hit: SearchHit) {
        match self.groups.iter_mut().find(|(label, _)| *label == hit.search_type) {
            Some((_, hits)) => hits.push(hit),
            None => self.groups.push((hit.search_type.clone(), vec![hit])),
        }
    }

    pub fn extend(&mut self, hits: impl IntoIterator<Item = SearchHit>) {
        for hit in hits {
            self.push(hit);
        }
    }

    pub fn group(&self, label: &str) -> Option<&[SearchHit]> {
        self.groups
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, hits)| hits.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SearchHit])> {
        self.groups
            .iter()
            .map(|(label, hits)| (label.as_str(), hits.as_slice()))
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total hits across all groups.
    pub fn total_hits(&self) -> usize {
        self.groups.iter().map(|(_, hits)| hits.len()).sum()
    }
}

// Serialized as a label -> hits mapping in group order.
impl Serialize for SearchResults {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (label, hits) in &self.groups {
            map.serialize_entry(label, hits)?;
        }
        map.end()
    }
}
