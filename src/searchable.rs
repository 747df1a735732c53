//! The opt-in capability every searchable entity type implements.

use crate::model::types::EntityRef;

/// Capability contract for entities that participate in tag search.
///
/// Implementations supply their identity, the raw attribute values tags are
/// derived from, and optionally a grouping label and a result projection.
/// Blank candidate values are dropped by the index, so implementations do not
/// need to pre-filter.
pub trait Searchable {
    /// Type label, also used as the default grouping label.
    fn entity_type(&self) -> &str;

    /// The entity's key within its own type.
    fn entity_id(&self) -> i64;

    /// Raw candidate tag values. Each value becomes one tag verbatim; no
    /// splitting is applied on this side.
    fn attributes_for_tags(&self) -> Vec<String>;

    /// Label used to group this entity in search results.
    fn search_type(&self) -> String {
        self.entity_type().to_string()
    }

    /// Projection stored alongside the entity and returned in search hits.
    fn map_for_search(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.entity_type(), self.entity_id())
    }
}
