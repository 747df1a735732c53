//! Tag index layer.
//!
//! This module provides the tag lifecycle and search core, including:
//!
//! - **[`tokens`]**: blank-filtering and deduplication for tag candidates and
//!   query text.
//! - **[`results`]**: the merged, search-type-grouped result collection.
//! - **[`searcher`]**: multi-entity-type search with per-source scopes.
//! - [`SearchIndex`]: reference-counted tagging of entities against a
//!   [`Store`] backend.

pub mod results;
pub mod searcher;
pub mod tokens;

use anyhow::Result;
use tracing::debug;

use crate::model::types::{EntityRef, SearchHit, Tag, TagId};
use crate::searchable::Searchable;
use crate::storage::Store;

/// Reference-counted tag index over a storage backend.
///
/// Owns the tag lifecycle: create on first use, one usage increment per
/// association, deletion once the last reference is released. Every
/// multi-step mutation runs in a single store transaction.
pub struct SearchIndex<S: Store> {
    store: S,
}

impl<S: Store> SearchIndex<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Declare an entity type searchable without tagging anything yet.
    pub fn register(&mut self, entity_type: &str) -> Result<()> {
        self.store.declare_searchable(entity_type)
    }

    pub fn is_registered(&self, entity_type: &str) -> Result<bool> {
        self.store.is_searchable(entity_type)
    }

    /// Derive tags from the entity's attributes and associate them.
    ///
    /// Blank candidates are dropped and duplicates collapsed; when nothing
    /// remains the call is a no-op. Otherwise the entity projection is
    /// stored, missing tags are created, usage counters incremented, and
    /// associations written, all in one transaction.
    pub fn tag_entity(&mut self, entity: &dyn Searchable) -> Result<()> {
        self.store.declare_searchable(entity.entity_type())?;

        let names = tokens::normalize_tags(entity.attributes_for_tags());
        if names.is_empty() {
            debug!(
                entity_type = entity.entity_type(),
                entity_id = entity.entity_id(),
                "tag_entity skipped, no usable tag candidates"
            );
            return Ok(());
        }

        let entity_ref = entity.entity_ref();
        let hit = projection(entity);
        let attached = self.in_tx(|store| {
            store.upsert_entity(&hit)?;
            let tags = store.get_or_create(&names)?;
            let ids = tag_ids(&tags);
            // Tags already associated with this entity keep their existing
            // reference; only genuinely new associations get an increment.
            let current = tag_ids(&store.tags_of(&entity_ref)?);
            let added: Vec<TagId> = ids
                .iter()
                .filter(|id| !current.contains(id))
                .copied()
                .collect();
            store.bump_usage(&added, 1)?;
            store.attach(&entity_ref, &ids)?;
            Ok(ids.len())
        })?;

        debug!(
            entity_type = %entity_ref.entity_type,
            entity_id = entity_ref.entity_id,
            tags = attached,
            "tag_entity"
        );
        Ok(())
    }

    /// Full resync of the entity's tags from its current attributes.
    ///
    /// The old tag set is released (decrement, delete orphans) and the
    /// associations replaced wholesale; there is no incremental diffing.
    pub fn retag_entity(&mut self, entity: &dyn Searchable) -> Result<()> {
        self.store.declare_searchable(entity.entity_type())?;

        let entity_ref = entity.entity_ref();
        let names = tokens::normalize_tags(entity.attributes_for_tags());
        let hit = projection(entity);

        let (pruned, attached) = self.in_tx(|store| {
            let current = tag_ids(&store.tags_of(&entity_ref)?);
            let pruned = store.prune_unused(&current)?;
            store.detach_all(&entity_ref)?;

            if names.is_empty() {
                return Ok((pruned, 0));
            }

            store.upsert_entity(&hit)?;
            let tags = store.get_or_create(&names)?;
            let ids = tag_ids(&tags);
            store.bump_usage(&ids, 1)?;
            store.attach(&entity_ref, &ids)?;
            Ok((pruned, ids.len()))
        })?;

        debug!(
            entity_type = %entity_ref.entity_type,
            entity_id = entity_ref.entity_id,
            pruned,
            tags = attached,
            "retag_entity"
        );
        Ok(())
    }

    /// Release the entity's tags and forget the entity.
    pub fn untag_entity(&mut self, entity: &EntityRef) -> Result<()> {
        let pruned = self.in_tx(|store| {
            let current = tag_ids(&store.tags_of(entity)?);
            let pruned = store.prune_unused(&current)?;
            store.detach_all(entity)?;
            store.remove_entity(entity)?;
            Ok(pruned)
        })?;

        debug!(
            entity_type = %entity.entity_type,
            entity_id = entity.entity_id,
            pruned,
            "untag_entity"
        );
        Ok(())
    }

    /// Current tags of one entity.
    pub fn tags_of(&self, entity: &EntityRef) -> Result<Vec<Tag>> {
        self.store.tags_of(entity)
    }

    pub(crate) fn find_tagged(
        &self,
        entity_type: &str,
        query_tokens: &[String],
        strict: bool,
    ) -> Result<Vec<SearchHit>> {
        self.store.find_tagged(entity_type, query_tokens, strict)
    }

    fn in_tx<T>(&mut self, f: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        self.store.begin()?;
        match f(&mut self.store) {
            Ok(value) => {
                self.store.commit()?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.store.rollback();
                Err(err)
            }
        }
    }
}

fn projection(entity: &dyn Searchable) -> SearchHit {
    SearchHit {
        entity_type: entity.entity_type().to_string(),
        entity_id: entity.entity_id(),
        search_type: entity.search_type(),
        payload: entity.map_for_search(),
    }
}

fn tag_ids(tags: &[Tag]) -> Vec<TagId> {
    tags.iter().map(|t| t.id).collect()
}
