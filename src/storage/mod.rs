//! Storage capability the index core is written against.
//!
//! The core never builds SQL itself; it talks to a [`Store`], and the
//! relational specifics live in the [`sqlite`] adapter. The contract is
//! deliberately narrow: batched tag get-or-create, atomic counter bumps,
//! conditional orphan deletes, polymorphic many-to-many associations, and a
//! per-type tag-overlap lookup.

pub mod sqlite;

use anyhow::Result;

use crate::model::types::{EntityRef, SearchHit, Tag, TagId};

pub trait Store {
    /// Start a write transaction. Mutating index operations wrap every
    /// multi-step change (prune old + attach new) in one transaction so a
    /// failure never leaves counters decremented without the matching
    /// association change.
    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;

    /// Fetch existing tags for `names` and create the missing ones with a
    /// usage count of zero. One batched lookup, one batched insert, one
    /// re-read for generated ids; never a per-name round trip. Must be safe
    /// under concurrent callers creating the same name.
    fn get_or_create(&mut self, names: &[String]) -> Result<Vec<Tag>>;

    /// Atomically add `delta` to the usage count of every tag in `ids`.
    fn bump_usage(&mut self, ids: &[TagId], delta: i64) -> Result<()>;

    /// Release one reference from every tag in `ids`: decrement the counters,
    /// then delete tags whose count dropped to zero (associations go with
    /// them). Returns the number of tags deleted.
    fn prune_unused(&mut self, ids: &[TagId]) -> Result<usize>;

    fn attach(&mut self, entity: &EntityRef, ids: &[TagId]) -> Result<()>;
    fn detach_all(&mut self, entity: &EntityRef) -> Result<()>;
    fn tags_of(&self, entity: &EntityRef) -> Result<Vec<Tag>>;

    /// Store or refresh the entity's search projection.
    fn upsert_entity(&mut self, hit: &SearchHit) -> Result<()>;
    fn remove_entity(&mut self, entity: &EntityRef) -> Result<()>;

    /// Record that `entity_type` implements the searchable capability. The
    /// registry is persistent so a reopened database still knows its types.
    fn declare_searchable(&mut self, entity_type: &str) -> Result<()>;
    fn is_searchable(&self, entity_type: &str) -> Result<bool>;

    /// Entities of `entity_type` having at least one tag whose text is in
    /// `tokens` (exact), or, when `strict` is false, containing any token
    /// as a case-sensitive substring. Order follows entity insertion order.
    fn find_tagged(&self, entity_type: &str, tokens: &[String], strict: bool)
    -> Result<Vec<SearchHit>>;
}
