//! Explicit lifecycle glue between entity management and the tag index.
//!
//! The entity-management layer calls these from its own create/update/delete
//! paths; nothing here is event-driven. Each call takes a `with_tags` flag so
//! a single operation can skip tag processing without any per-entity state.

use anyhow::Result;

use crate::index::SearchIndex;
use crate::searchable::Searchable;
use crate::storage::Store;

pub struct EntityHooks<'a, S: Store> {
    index: &'a mut SearchIndex<S>,
}

impl<'a, S: Store> EntityHooks<'a, S> {
    pub fn new(index: &'a mut SearchIndex<S>) -> Self {
        Self { index }
    }

    /// After an entity is created.
    pub fn created(&mut self, entity: &dyn Searchable, with_tags: bool) -> Result<()> {
        if with_tags {
            self.index.tag_entity(entity)?;
        }
        Ok(())
    }

    /// After an entity is updated. Resyncs the full tag set.
    pub fn updated(&mut self, entity: &dyn Searchable, with_tags: bool) -> Result<()> {
        if with_tags {
            self.index.retag_entity(entity)?;
        }
        Ok(())
    }

    /// Before an entity is deleted.
    pub fn deleting(&mut self, entity: &dyn Searchable, with_tags: bool) -> Result<()> {
        if with_tags {
            self.index.untag_entity(&entity.entity_ref())?;
        }
        Ok(())
    }
}
