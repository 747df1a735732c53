//! SQLite backend: schema, pragmas, migrations, and the [`Store`] impl.

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params, types::Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::model::types::{EntityRef, SearchHit, Tag, TagId};
use crate::storage::Store;

const SCHEMA_VERSION: i64 = 1;

const MIGRATION_V1: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY,
    tag TEXT NOT NULL UNIQUE,
    used INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS entities (
    entity_type TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    search_type TEXT NOT NULL,
    payload_json TEXT NOT NULL,
    PRIMARY KEY (entity_type, entity_id)
);

CREATE TABLE IF NOT EXISTS taggables (
    entity_type TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (entity_type, entity_id, tag_id)
);

CREATE TABLE IF NOT EXISTS searchable_types (
    entity_type TEXT PRIMARY KEY
);

CREATE INDEX IF NOT EXISTS idx_taggables_tag
    ON taggables(tag_id);

CREATE INDEX IF NOT EXISTS idx_taggables_entity
    ON taggables(entity_type, entity_id);
"#;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating db directory {}", parent.display()))?;
        }

        let mut conn = Connection::open(path)
            .with_context(|| format!("opening sqlite db at {}", path.display()))?;

        Self::setup(&mut conn)?;
        Ok(Self { conn })
    }

    /// Private in-memory database, used by tests and throwaway sessions.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().context("opening in-memory sqlite db")?;
        Self::setup(&mut conn)?;
        Ok(Self { conn })
    }

    fn setup(conn: &mut Connection) -> Result<()> {
        apply_pragmas(conn)?;
        init_meta(conn)?;
        migrate(conn)
    }

    pub fn raw(&self) -> &Connection {
        &self.conn
    }

    /// All tags ordered by text, for listing and diagnostics.
    pub fn all_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, tag, used FROM tags ORDER BY tag")?;
        let rows = stmt.query_map([], tag_from_row)?;
        rows.map(|r| r.map_err(Into::into)).collect()
    }

    fn select_tags_by_text(&self, names: &[String]) -> Result<HashMap<String, Tag>> {
        let sql = format!(
            "SELECT id, tag, used FROM tags WHERE tag IN ({})",
            placeholders(names.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let map = stmt
            .query_map(rusqlite::params_from_iter(names), tag_from_row)?
            .map(|r| r.map(|t| (t.text.clone(), t)))
            .collect::<rusqlite::Result<_>>()?;
        Ok(map)
    }

    /// Entity types present in the persistent capability registry.
    pub fn searchable_types(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT entity_type FROM searchable_types ORDER BY entity_type")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.map(|r| r.map_err(Into::into)).collect()
    }
}

impl Store for SqliteStore {
    fn begin(&mut self) -> Result<()> {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .context("starting transaction")
    }

    fn commit(&mut self) -> Result<()> {
        self.conn
            .execute_batch("COMMIT")
            .context("committing transaction")
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn
            .execute_batch("ROLLBACK")
            .context("rolling back transaction")
    }

    fn get_or_create(&mut self, names: &[String]) -> Result<Vec<Tag>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_text = self.select_tags_by_text(names)?;

        let missing: Vec<String> = names
            .iter()
            .filter(|name| !by_text.contains_key(*name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            // Conflict-ignoring so a concurrent caller creating the same name
            // does not fail the batch; the re-read picks up either row.
            let insert_sql = format!(
                "INSERT INTO tags(tag, used) VALUES {} ON CONFLICT(tag) DO NOTHING",
                vec!["(?, 0)"; missing.len()].join(", ")
            );
            self.conn
                .execute(&insert_sql, rusqlite::params_from_iter(&missing))
                .context("inserting missing tags")?;
            by_text.extend(self.select_tags_by_text(&missing)?);
        }

        // Return in input-name order.
        names
            .iter()
            .map(|name| {
                by_text
                    .remove(name)
                    .ok_or_else(|| anyhow!("tag '{name}' missing after upsert"))
            })
            .collect()
    }

    fn bump_usage(&mut self, ids: &[TagId], delta: i64) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "UPDATE tags SET used = used + ?1 WHERE id IN ({})",
            placeholders_from(2, ids.len())
        );
        let mut values: Vec<Value> = vec![Value::Integer(delta)];
        values.extend(ids.iter().map(|t| Value::Integer(t.0)));
        self.conn
            .execute(&sql, rusqlite::params_from_iter(values))
            .context("bumping tag usage")?;
        Ok(())
    }

    fn prune_unused(&mut self, ids: &[TagId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        // Decrement first, then drop tags no entity references any more.
        // Associations follow via the FK cascade.
        let marks = placeholders(ids.len());
        self.conn.execute(
            &format!("UPDATE tags SET used = used - 1 WHERE id IN ({marks})"),
            rusqlite::params_from_iter(ids.iter().map(|t| t.0)),
        )?;
        let deleted = self.conn.execute(
            &format!("DELETE FROM tags WHERE id IN ({marks}) AND used <= 0"),
            rusqlite::params_from_iter(ids.iter().map(|t| t.0)),
        )?;
        Ok(deleted)
    }

    fn attach(&mut self, entity: &EntityRef, ids: &[TagId]) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO taggables(entity_type, entity_id, tag_id) VALUES(?,?,?)
             ON CONFLICT(entity_type, entity_id, tag_id) DO NOTHING",
        )?;
        for id in ids {
            stmt.execute(params![entity.entity_type, entity.entity_id, id.0])?;
        }
        Ok(())
    }

    fn detach_all(&mut self, entity: &EntityRef) -> Result<()> {
        self.conn.execute(
            "DELETE FROM taggables WHERE entity_type = ? AND entity_id = ?",
            params![entity.entity_type, entity.entity_id],
        )?;
        Ok(())
    }

    fn tags_of(&self, entity: &EntityRef) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT t.id, t.tag, t.used FROM tags t
             JOIN taggables a ON a.tag_id = t.id
             WHERE a.entity_type = ? AND a.entity_id = ?
             ORDER BY t.id",
        )?;
        let rows = stmt.query_map(params![entity.entity_type, entity.entity_id], tag_from_row)?;
        rows.map(|r| r.map_err(Into::into)).collect()
    }

    fn upsert_entity(&mut self, hit: &SearchHit) -> Result<()> {
        self.conn.execute(
            "INSERT INTO entities(entity_type, entity_id, search_type, payload_json)
             VALUES(?,?,?,?)
             ON CONFLICT(entity_type, entity_id) DO UPDATE SET
                 search_type = excluded.search_type,
                 payload_json = excluded.payload_json",
            params![
                hit.entity_type,
                hit.entity_id,
                hit.search_type,
                serde_json::to_string(&hit.payload)?
            ],
        )?;
        Ok(())
    }

    fn remove_entity(&mut self, entity: &EntityRef) -> Result<()> {
        self.conn.execute(
            "DELETE FROM entities WHERE entity_type = ? AND entity_id = ?",
            params![entity.entity_type, entity.entity_id],
        )?;
        Ok(())
    }

    fn declare_searchable(&mut self, entity_type: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO searchable_types(entity_type) VALUES(?)
             ON CONFLICT(entity_type) DO NOTHING",
            params![entity_type],
        )?;
        Ok(())
    }

    fn is_searchable(&self, entity_type: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM searchable_types WHERE entity_type = ?",
                params![entity_type],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn find_tagged(
        &self,
        entity_type: &str,
        tokens: &[String],
        strict: bool,
    ) -> Result<Vec<SearchHit>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        // Exact membership always applies; non-strict extends with a
        // case-sensitive substring test. instr() rather than LIKE because
        // SQLite LIKE is case-insensitive for ASCII.
        let exact = format!("t.tag IN ({})", placeholders(tokens.len()));
        let fuzzy = if strict {
            String::new()
        } else {
            let parts: Vec<String> = (0..tokens.len())
                .map(|i| format!("instr(t.tag, ?{}) > 0", tokens.len() + i + 2))
                .collect();
            format!(" OR {}", parts.join(" OR "))
        };

        let sql = format!(
            "SELECT e.entity_type, e.entity_id, e.search_type, e.payload_json
             FROM entities e
             WHERE e.entity_type = ?1 AND EXISTS (
                 SELECT 1 FROM taggables a
                 JOIN tags t ON t.id = a.tag_id
                 WHERE a.entity_type = e.entity_type
                   AND a.entity_id = e.entity_id
                   AND ({exact}{fuzzy})
             )
             ORDER BY e.rowid"
        );

        let mut values: Vec<Value> = vec![Value::Text(entity_type.to_owned())];
        values.extend(tokens.iter().cloned().map(Value::Text));
        if !strict {
            values.extend(tokens.iter().cloned().map(Value::Text));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (entity_type, entity_id, search_type, payload_json) = row?;
            hits.push(SearchHit {
                entity_type,
                entity_id,
                search_type,
                payload: serde_json::from_str(&payload_json)
                    .with_context(|| format!("decoding payload for entity {entity_id}"))?,
            });
        }
        Ok(hits)
    }
}

fn apply_pragmas(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        "#,
    )?;
    Ok(())
}

fn init_meta(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        [],
    )?;

    let existing: Option<i64> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0).map(|s| s.parse().unwrap_or(0)),
        )
        .optional()?;

    if existing.is_none() {
        conn.execute(
            "INSERT OR IGNORE INTO meta(key, value) VALUES('schema_version', ?)",
            params![SCHEMA_VERSION.to_string()],
        )?;
    }

    Ok(())
}

fn migrate(conn: &mut Connection) -> Result<()> {
    let current: i64 = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0).map(|s| s.parse().unwrap_or(0)),
        )
        .optional()?
        .unwrap_or(0);

    match current {
        0 => {
            conn.execute_batch(MIGRATION_V1)?;
            conn.execute(
                "UPDATE meta SET value = ? WHERE key = 'schema_version'",
                params![SCHEMA_VERSION.to_string()],
            )?;
        }
        v if v == SCHEMA_VERSION => {
            // init_meta writes the version row before the tables exist.
            conn.execute_batch(MIGRATION_V1)?;
        }
        v => return Err(anyhow!("unsupported schema version {}", v)),
    }

    Ok(())
}

fn tag_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: TagId(row.get(0)?),
        text: row.get(1)?,
        used: row.get(2)?,
    })
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn placeholders_from(start: usize, n: usize) -> String {
    (0..n)
        .map(|i| format!("?{}", start + i))
        .collect::<Vec<_>>()
        .join(", ")
}
