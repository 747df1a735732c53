//! Core data types shared across the tag store, index, and search layers.

use serde::{Deserialize, Serialize};

/// Row id of a tag in the shared `tags` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub i64);

/// A reference-counted tag.
///
/// `text` is unique (case-sensitive exact string). `used` counts live
/// associations across all entity types; it never goes negative, and a tag
/// whose count reaches zero is deleted rather than kept dangling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub text: String,
    pub used: i64,
}

/// Identity of a tagged entity: a type label plus the entity's own key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: String,
    pub entity_id: i64,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, entity_id: i64) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id,
        }
    }
}

/// Transient view of an entity returned from a search.
///
/// `search_type` is the grouping label the entity declared when it was tagged;
/// `payload` is its `map_for_search` projection. Neither is interpreted by the
/// core beyond grouping and pass-through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub entity_type: String,
    pub entity_id: i64,
    pub search_type: String,
    pub payload: serde_json::Value,
}

impl SearchHit {
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.entity_type.clone(), self.entity_id)
    }
}
