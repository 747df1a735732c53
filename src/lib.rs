pub mod config;
pub mod hooks;
pub mod index;
pub mod model;
pub mod searchable;
pub mod storage;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use config::Config;
use index::SearchIndex;
use index::searcher::Searcher;
use model::types::EntityRef;
use searchable::Searchable;
use storage::sqlite::SqliteStore;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "tagsearch",
    version,
    about = "Reference-counted tag index and multi-type tag search"
)]
pub struct Cli {
    /// Path to the SQLite database (defaults to platform data dir)
    #[arg(long)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tag a newly created entity
    Tag {
        /// Entity type, e.g. "post"
        entity_type: String,
        /// Entity id within its type
        id: i64,
        /// Tag values (blanks are dropped, duplicates collapsed)
        tags: Vec<String>,

        /// Grouping label (defaults to the entity type)
        #[arg(long)]
        search_type: Option<String>,

        /// JSON payload stored with the entity and returned in hits
        #[arg(long)]
        payload: Option<String>,
    },
    /// Resync an entity's tags after an update
    Retag {
        entity_type: String,
        id: i64,
        tags: Vec<String>,

        #[arg(long)]
        search_type: Option<String>,

        #[arg(long)]
        payload: Option<String>,
    },
    /// Release an entity's tags before deletion
    Untag { entity_type: String, id: i64 },
    /// Search entities by tags, grouped by search type
    Search {
        /// Query text; tokens are whitespace-separated
        query: String,

        /// Exact tag matches only (no substring extension)
        #[arg(long, conflicts_with = "no_strict")]
        strict: bool,

        /// Allow substring matches even when the config defaults to strict
        #[arg(long)]
        no_strict: bool,

        /// Entity types to search (defaults to all registered types)
        #[arg(long = "type")]
        types: Vec<String>,
    },
    /// List all tags with their usage counts
    Tags,
}

/// A tagged entity described entirely on the command line.
struct CliEntity {
    entity_type: String,
    id: i64,
    tags: Vec<String>,
    search_type: Option<String>,
    payload: serde_json::Value,
}

impl Searchable for CliEntity {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn entity_id(&self) -> i64 {
        self.id
    }

    fn attributes_for_tags(&self) -> Vec<String> {
        self.tags.clone()
    }

    fn search_type(&self) -> String {
        self.search_type
            .clone()
            .unwrap_or_else(|| self.entity_type.clone())
    }

    fn map_for_search(&self) -> serde_json::Value {
        self.payload.clone()
    }
}

pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(config::ConfigError::NoConfigDir) => Config::default(),
        Err(err) => return Err(err.into()),
    };

    let db_path = cli
        .db
        .or_else(|| cfg.db.clone())
        .unwrap_or_else(default_db_path);
    let store = SqliteStore::open(&db_path)?;
    let mut index = SearchIndex::new(store);

    match cli.command {
        Commands::Tag {
            entity_type,
            id,
            tags,
            search_type,
            payload,
        } => {
            let entity = cli_entity(entity_type, id, tags, search_type, payload)?;
            index.tag_entity(&entity)
        }
        Commands::Retag {
            entity_type,
            id,
            tags,
            search_type,
            payload,
        } => {
            let entity = cli_entity(entity_type, id, tags, search_type, payload)?;
            index.retag_entity(&entity)
        }
        Commands::Untag { entity_type, id } => {
            index.untag_entity(&EntityRef::new(entity_type, id))
        }
        Commands::Search {
            query,
            strict,
            no_strict,
            types,
        } => {
            // Flags win over the config default.
            let strict = if strict {
                true
            } else if no_strict {
                false
            } else {
                cfg.strict
            };
            run_search(&index, &query, strict, types)
        }
        Commands::Tags => {
            for tag in index.store().all_tags()? {
                println!("{}\t{}", tag.used, tag.text);
            }
            Ok(())
        }
    }
}

fn run_search(
    index: &SearchIndex<SqliteStore>,
    query: &str,
    strict: bool,
    types: Vec<String>,
) -> Result<()> {
    let types = if types.is_empty() {
        index.store().searchable_types()?
    } else {
        types
    };

    let mut searcher = Searcher::new();
    for entity_type in types {
        searcher.add_source(index, entity_type, None)?;
    }

    let results = searcher.search(index, query, strict)?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn cli_entity(
    entity_type: String,
    id: i64,
    tags: Vec<String>,
    search_type: Option<String>,
    payload: Option<String>,
) -> Result<CliEntity> {
    let payload = match payload {
        Some(raw) => serde_json::from_str(&raw).context("parsing --payload as JSON")?,
        None => serde_json::Value::Null,
    };
    Ok(CliEntity {
        entity_type,
        id,
        tags,
        search_type,
        payload,
    })
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "tagsearch", "tagsearch")
        .map(|dirs| dirs.data_dir().join("tags.db"))
        .unwrap_or_else(|| PathBuf::from("tags.db"))
}
