//! Multi-entity-type search over a [`SearchIndex`].

use thiserror::Error;
use tracing::debug;

use crate::index::results::SearchResults;
use crate::index::{SearchIndex, tokens};
use crate::model::types::SearchHit;
use crate::storage::Store;

/// Pass-through filter applied to one source's hits. Not interpreted by the
/// core; the caller decides what it means.
pub type ScopeFn = Box<dyn Fn(&SearchHit) -> bool + Send + Sync>;

#[derive(Error, Debug)]
pub enum SearcherError {
    #[error("entity type '{0}' is not registered as searchable")]
    Configuration(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

struct SearchSource {
    entity_type: String,
    scope: Option<ScopeFn>,
}

/// Runs one tag query across several registered entity types and groups the
/// merged hits by search-type label.
#[derive(Default)]
pub struct Searcher {
    sources: Vec<SearchSource>,
}

impl std::fmt::Debug for Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Searcher")
            .field(
                "sources",
                &self
                    .sources
                    .iter()
                    .map(|s| s.entity_type.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Searcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type, optionally with a scope filter.
    ///
    /// Fails with [`SearcherError::Configuration`] when the type was never
    /// declared searchable on the index.
    pub fn add_source<S: Store>(
        &mut self,
        index: &SearchIndex<S>,
        entity_type: impl Into<String>,
        scope: Option<ScopeFn>,
    ) -> Result<&mut Self, SearcherError> {
        let entity_type = entity_type.into();
        if !index.is_registered(&entity_type)? {
            return Err(SearcherError::Configuration(entity_type));
        }
        self.sources.push(SearchSource { entity_type, scope });
        Ok(self)
    }

    /// Tokenize `query` and collect matching entities from every source.
    ///
    /// A blank query yields an empty grouped collection; there is no implicit
    /// match-all. Sources are queried in registration order, which fixes both
    /// the merge order and the first-seen order of result groups.
    pub fn search<S: Store>(
        &self,
        index: &SearchIndex<S>,
        query: &str,
        strict: bool,
    ) -> Result<SearchResults, SearcherError> {
        let mut results = SearchResults::new();

        let query_tokens = tokens::parse_query(query);
        if query_tokens.is_empty() {
            return Ok(results);
        }

        for source in &self.sources {
            let hits = index.find_tagged(&source.entity_type, &query_tokens, strict)?;
            match &source.scope {
                Some(keep) => results.extend(hits.into_iter().filter(|h| keep(h))),
                None => results.extend(hits),
            }
        }

        debug!(
            tokens = query_tokens.len(),
            strict,
            sources = self.sources.len(),
            groups = results.len(),
            hits = results.total_hits(),
            "search"
        );
        Ok(results)
    }
}
