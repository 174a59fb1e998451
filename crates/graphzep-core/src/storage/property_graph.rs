//! Labelled-property adapter (C4)
//!
//! rusqlite-backed: separate reader/writer `Mutex<Connection>`, WAL pragmas,
//! idempotent migration application over the node/edge tables in
//! [`super::migrations`].
//!
//! [`GraphStore::execute_query`]/[`GraphStore::mutate`] interpret the bounded
//! pattern subset from spec §4.4: single-hop `MATCH` with a node label and
//! equality/`IS NOT NULL` constraints, `SET prop = value`, `DETACH DELETE`,
//! and `ORDER BY ... LIMIT`. Everything above that — relation traversal,
//! `MERGE`, the cosine `reduce` — is exposed as typed methods on
//! `PropertyGraphStore` directly, the way the rest of this crate actually
//! calls into storage (graph consumers write Rust, not pattern strings).

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Mutex;

use super::migrations::MIGRATIONS;
use super::{GraphStore, Row};
use crate::error::{Error, Result};
use crate::model::{Community, Entity, EpisodeType, Episodic};

pub struct PropertyGraphStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )
}

impl PropertyGraphStore {
    /// Opens (creating if absent) the SQLite file at `path`, or a
    /// shared-cache in-memory database when `path` is `None` (used by
    /// tests) so the reader and writer connections see the same data.
    pub fn open(path: Option<PathBuf>) -> Result<Self> {
        const MEMORY_URI: &str = "file::memory:?cache=shared";
        let flags = rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
            | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
            | rusqlite::OpenFlags::SQLITE_OPEN_URI
            | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let writer = match &path {
            Some(p) => Connection::open(p).map_err(Error::from)?,
            None => Connection::open_with_flags(MEMORY_URI, flags).map_err(Error::from)?,
        };
        configure(&writer).map_err(Error::from)?;

        let reader = match &path {
            Some(p) => Connection::open(p).map_err(Error::from)?,
            None => Connection::open_with_flags(MEMORY_URI, flags).map_err(Error::from)?,
        };
        configure(&reader).map_err(Error::from)?;

        let store = Self {
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        };
        store.apply_migrations()?;
        Ok(store)
    }

    fn apply_migrations(&self) -> Result<()> {
        let mut conn = self.writer.lock().expect("writer poisoned");
        let tx = conn.transaction().map_err(Error::from)?;
        tx.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);",
        )
        .map_err(Error::from)?;
        let applied: u32 = tx
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
            .map_err(Error::from)?;
        for migration in MIGRATIONS {
            if migration.version > applied {
                tx.execute_batch(migration.up).map_err(Error::from)?;
                tx.execute("INSERT INTO schema_version (version) VALUES (?1)", params![migration.version])
                    .map_err(Error::from)?;
            }
        }
        tx.commit().map_err(Error::from)?;
        Ok(())
    }

    // -- typed node operations, used directly by extraction/retrieval/session --

    pub fn insert_entity(&self, e: &Entity) -> Result<()> {
        let conn = self.writer.lock().expect("writer poisoned");
        conn.execute(
            "INSERT INTO entity (uuid, group_id, name, entity_type, summary, summary_embedding, fact_ids, labels, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(uuid) DO UPDATE SET
                name=excluded.name, entity_type=excluded.entity_type, summary=excluded.summary,
                summary_embedding=excluded.summary_embedding, fact_ids=excluded.fact_ids, labels=excluded.labels",
            params![
                e.uuid.to_string(),
                e.group_id,
                e.name,
                e.entity_type,
                e.summary,
                e.summary_embedding.as_ref().map(|v| serde_json::to_string(v).unwrap()),
                serde_json::to_string(&e.fact_ids).unwrap(),
                serde_json::to_string(&e.labels).unwrap(),
                e.created_at.to_rfc3339(),
            ],
        )
        .map_err(Error::from)?;
        Ok(())
    }

    /// Looks up an entity by `(name, group_id)` — the extraction pipeline's
    /// dedup key. Tie-breaks on earliest `created_at` when more than one
    /// entity shares the name within a group.
    pub fn find_entity_by_name(&self, name: &str, group_id: &str) -> Result<Option<Entity>> {
        let conn = self.reader.lock().expect("reader poisoned");
        conn.query_row(
            "SELECT uuid, group_id, name, entity_type, summary, summary_embedding, fact_ids, labels, created_at
             FROM entity WHERE name = ?1 AND group_id = ?2 ORDER BY created_at ASC LIMIT 1",
            params![name, group_id],
            Self::row_to_entity,
        )
        .optional()
        .map_err(Error::from)
    }

    pub fn get_entity(&self, uuid: &str) -> Result<Option<Entity>> {
        let conn = self.reader.lock().expect("reader poisoned");
        conn.query_row(
            "SELECT uuid, group_id, name, entity_type, summary, summary_embedding, fact_ids, labels, created_at
             FROM entity WHERE uuid = ?1",
            params![uuid],
            Self::row_to_entity,
        )
        .optional()
        .map_err(Error::from)
    }

    pub fn entities_by_group(&self, group_id: &str) -> Result<Vec<Entity>> {
        let conn = self.reader.lock().expect("reader poisoned");
        let mut stmt = conn
            .prepare(
                "SELECT uuid, group_id, name, entity_type, summary, summary_embedding, fact_ids, labels, created_at
                 FROM entity WHERE group_id = ?1",
            )
            .map_err(Error::from)?;
        let rows = stmt
            .query_map(params![group_id], Self::row_to_entity)
            .map_err(Error::from)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    fn row_to_entity(row: &rusqlite::Row) -> rusqlite::Result<Entity> {
        let summary_embedding: Option<String> = row.get(5)?;
        let fact_ids: String = row.get(6)?;
        let labels: String = row.get(7)?;
        let created_at: String = row.get(8)?;
        Ok(Entity {
            uuid: row.get::<_, String>(0)?.parse().unwrap_or_default(),
            group_id: row.get(1)?,
            name: row.get(2)?,
            entity_type: row.get(3)?,
            summary: row.get(4)?,
            summary_embedding: summary_embedding.and_then(|s| serde_json::from_str(&s).ok()),
            fact_ids: serde_json::from_str(&fact_ids).unwrap_or_default(),
            labels: serde_json::from_str(&labels).unwrap_or_default(),
            created_at: created_at.parse().unwrap_or_else(|_| chrono::Utc::now()),
        })
    }

    const EPISODIC_COLUMNS: &'static str =
        "uuid, group_id, name, episode_type, content, embedding, valid_at, invalid_at, reference_id, created_at, access_count, last_accessed_at, memory_type";

    pub fn insert_episodic(&self, ep: &Episodic) -> Result<()> {
        let conn = self.writer.lock().expect("writer poisoned");
        conn.execute(
            "INSERT INTO episodic (uuid, group_id, name, episode_type, content, embedding, valid_at, invalid_at, reference_id, created_at, access_count, last_accessed_at, memory_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(uuid) DO UPDATE SET
                content=excluded.content, embedding=excluded.embedding,
                valid_at=excluded.valid_at, invalid_at=excluded.invalid_at",
            params![
                ep.uuid.to_string(),
                ep.group_id,
                ep.name,
                episode_type_str(ep.episode_type),
                ep.content,
                ep.embedding.as_ref().map(|v| serde_json::to_string(v).unwrap()),
                ep.valid_at.to_rfc3339(),
                ep.invalid_at.map(|t| t.to_rfc3339()),
                ep.reference_id,
                ep.created_at.to_rfc3339(),
                ep.access_count as i64,
                ep.last_accessed_at.map(|t| t.to_rfc3339()),
                memory_type_str(ep.memory_type),
            ],
        )
        .map_err(Error::from)?;
        Ok(())
    }

    pub fn get_episodic(&self, uuid: &str) -> Result<Option<Episodic>> {
        let conn = self.reader.lock().expect("reader poisoned");
        conn.query_row(
            &format!("SELECT {} FROM episodic WHERE uuid = ?1", Self::EPISODIC_COLUMNS),
            params![uuid],
            Self::row_to_episodic,
        )
        .optional()
        .map_err(Error::from)
    }

    pub fn episodics_by_group(&self, group_id: &str) -> Result<Vec<Episodic>> {
        let conn = self.reader.lock().expect("reader poisoned");
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM episodic WHERE group_id = ?1 ORDER BY created_at DESC", Self::EPISODIC_COLUMNS))
            .map_err(Error::from)?;
        let rows = stmt.query_map(params![group_id], Self::row_to_episodic).map_err(Error::from)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    /// Atomically increments `access_count` and stamps `last_accessed_at`,
    /// then returns the updated row (spec testable property 8).
    pub fn touch_episodic(&self, uuid: &str) -> Result<Option<Episodic>> {
        let conn = self.writer.lock().expect("writer poisoned");
        let now = chrono::Utc::now().to_rfc3339();
        let updated = conn
            .execute(
                "UPDATE episodic SET access_count = access_count + 1, last_accessed_at = ?1 WHERE uuid = ?2",
                params![now, uuid],
            )
            .map_err(Error::from)?;
        if updated == 0 {
            return Ok(None);
        }
        conn.query_row(
            &format!("SELECT {} FROM episodic WHERE uuid = ?1", Self::EPISODIC_COLUMNS),
            params![uuid],
            Self::row_to_episodic,
        )
        .optional()
        .map_err(Error::from)
    }

    fn row_to_episodic(row: &rusqlite::Row) -> rusqlite::Result<Episodic> {
        let embedding: Option<String> = row.get(5)?;
        let episode_type: String = row.get(3)?;
        let invalid_at: Option<String> = row.get(7)?;
        let created_at: String = row.get(9)?;
        let last_accessed_at: Option<String> = row.get(11)?;
        let memory_type: String = row.get(12)?;
        Ok(Episodic {
            uuid: row.get::<_, String>(0)?.parse().unwrap_or_default(),
            group_id: row.get(1)?,
            name: row.get(2)?,
            episode_type: parse_episode_type(&episode_type),
            content: row.get(4)?,
            embedding: embedding.and_then(|s| serde_json::from_str(&s).ok()),
            valid_at: row.get::<_, String>(6)?.parse().unwrap_or_else(|_| chrono::Utc::now()),
            invalid_at: invalid_at.and_then(|s| s.parse().ok()),
            reference_id: row.get(8)?,
            created_at: created_at.parse().unwrap_or_else(|_| chrono::Utc::now()),
            access_count: row.get::<_, i64>(10)? as u64,
            last_accessed_at: last_accessed_at.and_then(|s| s.parse().ok()),
            memory_type: parse_memory_type(&memory_type),
        })
    }

    /// `DETACH DELETE`: removes the episode and every mentions edge it owns.
    pub fn delete_episodic_detached(&self, uuid: &str) -> Result<()> {
        let mut conn = self.writer.lock().expect("writer poisoned");
        let tx = conn.transaction().map_err(Error::from)?;
        tx.execute("DELETE FROM edge_mentions WHERE source_uuid = ?1", params![uuid])
            .map_err(Error::from)?;
        tx.execute("DELETE FROM episodic WHERE uuid = ?1", params![uuid])
            .map_err(Error::from)?;
        tx.commit().map_err(Error::from)?;
        Ok(())
    }

    pub fn insert_community(&self, c: &Community) -> Result<()> {
        let conn = self.writer.lock().expect("writer poisoned");
        conn.execute(
            "INSERT INTO community (uuid, group_id, name, community_level, summary, summary_embedding, fact_ids, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                c.uuid.to_string(),
                c.group_id,
                c.name,
                c.community_level,
                c.summary,
                c.summary_embedding.as_ref().map(|v| serde_json::to_string(v).unwrap()),
                serde_json::to_string(&c.fact_ids).unwrap(),
                c.created_at.to_rfc3339(),
            ],
        )
        .map_err(Error::from)?;
        Ok(())
    }

    pub fn insert_mentions(&self, m: &crate::model::Mentions) -> Result<()> {
        let conn = self.writer.lock().expect("writer poisoned");
        conn.execute(
            "INSERT INTO edge_mentions (uuid, group_id, source_uuid, target_uuid, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                m.common.uuid.to_string(),
                m.common.group_id,
                m.common.source_uuid.to_string(),
                m.common.target_uuid.to_string(),
                m.common.created_at.to_rfc3339(),
            ],
        )
        .map_err(Error::from)?;
        Ok(())
    }

    /// Total `Mentions` edges in `group_id` (spec §8 testable property 1 /
    /// scenario A).
    pub fn mentions_count(&self, group_id: &str) -> Result<usize> {
        let conn = self.reader.lock().expect("reader poisoned");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM edge_mentions WHERE group_id = ?1", params![group_id], |r| r.get(0))
            .map_err(Error::from)?;
        Ok(count as usize)
    }

    /// `(source_uuid, target_uuid, name)` is the dedup key within a group
    /// (spec §4.9, step 5).
    pub fn find_relates_to(
        &self,
        group_id: &str,
        source_uuid: &str,
        target_uuid: &str,
        name: &str,
    ) -> Result<bool> {
        let conn = self.reader.lock().expect("reader poisoned");
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM edge_relates_to WHERE group_id = ?1 AND source_uuid = ?2 AND target_uuid = ?3 AND name = ?4",
                params![group_id, source_uuid, target_uuid, name],
                |r| r.get(0),
            )
            .map_err(Error::from)?;
        Ok(count > 0)
    }

    pub fn insert_relates_to(&self, r: &crate::model::RelatesTo) -> Result<()> {
        let conn = self.writer.lock().expect("writer poisoned");
        conn.execute(
            "INSERT INTO edge_relates_to (uuid, group_id, source_uuid, target_uuid, name, fact_ids, episodes, valid_at, invalid_at, expired_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                r.common.uuid.to_string(),
                r.common.group_id,
                r.common.source_uuid.to_string(),
                r.common.target_uuid.to_string(),
                r.name,
                serde_json::to_string(&r.fact_ids).unwrap(),
                serde_json::to_string(&r.episodes).unwrap(),
                r.valid_at.to_rfc3339(),
                r.invalid_at.map(|t| t.to_rfc3339()),
                r.expired_at.map(|t| t.to_rfc3339()),
                r.common.created_at.to_rfc3339(),
            ],
        )
        .map_err(Error::from)?;
        Ok(())
    }

    pub fn insert_has_member(&self, h: &crate::model::HasMember) -> Result<()> {
        let conn = self.writer.lock().expect("writer poisoned");
        conn.execute(
            "INSERT INTO edge_has_member (uuid, group_id, source_uuid, target_uuid, name, description, fact_ids, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                h.common.uuid.to_string(),
                h.common.group_id,
                h.common.source_uuid.to_string(),
                h.common.target_uuid.to_string(),
                h.name,
                h.description,
                h.fact_ids.as_ref().map(|f| serde_json::to_string(f).unwrap()),
                h.common.created_at.to_rfc3339(),
            ],
        )
        .map_err(Error::from)?;
        Ok(())
    }

    // -- facts (C3 reified statements, C12 persistence) --

    pub fn insert_fact(&self, f: &crate::model::Fact) -> Result<()> {
        let conn = self.writer.lock().expect("writer poisoned");
        conn.execute(
            "INSERT INTO fact (uuid, group_id, subject, predicate, object, confidence, source_memory_ids, valid_from, valid_until, metadata, state, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(uuid) DO UPDATE SET
                confidence=excluded.confidence, source_memory_ids=excluded.source_memory_ids,
                valid_until=excluded.valid_until, state=excluded.state",
            params![
                f.uuid.to_string(),
                f.group_id,
                f.subject,
                f.predicate,
                f.object,
                f.confidence,
                serde_json::to_string(&f.source_memory_ids).unwrap(),
                f.valid_from.to_rfc3339(),
                f.valid_until.map(|t| t.to_rfc3339()),
                serde_json::to_string(&f.metadata).unwrap(),
                fact_state_str(f.state),
                f.created_at.to_rfc3339(),
            ],
        )
        .map_err(Error::from)?;
        Ok(())
    }

    /// Supersedes any live fact sharing `triple_key` by setting its
    /// `valid_until` to the new assertion's `valid_from` and marking it
    /// `superseded` (spec §3's Relates-to note: "a later assertion ...
    /// supersedes rather than deletes the original"; §9's Fact state
    /// machine: `asserted -> superseded`).
    pub fn supersede_live_facts(&self, group_id: &str, subject: &str, predicate: &str, object: &str, superseded_by: chrono::DateTime<chrono::Utc>) -> Result<()> {
        let conn = self.writer.lock().expect("writer poisoned");
        conn.execute(
            "UPDATE fact SET valid_until = ?1, state = 'superseded'
             WHERE group_id = ?2 AND subject = ?3 AND predicate = ?4 AND object = ?5
               AND (valid_until IS NULL OR valid_until > ?1) AND valid_from < ?1",
            params![superseded_by.to_rfc3339(), group_id, subject, predicate, object],
        )
        .map_err(Error::from)?;
        Ok(())
    }

    /// Invalidates every other live fact sharing `(group_id, subject,
    /// predicate)` but naming a *different* object, as of `superseded_by`.
    ///
    /// `supersede_live_facts` only retires an exact repeat of the same
    /// triple (spec §9's literal state-machine trigger). A functional
    /// relation like `worksAt` also needs the case from spec §8 scenario
    /// B, where a later assertion names a *new* value (Globex instead of
    /// Acme) for the same subject+predicate: the old value must stop being
    /// "live" once the new one starts, even though the two triples are
    /// distinct. We treat same-subject-same-predicate as the same
    /// functional slot and retire whichever value was current before.
    pub fn invalidate_prior_values(&self, group_id: &str, subject: &str, predicate: &str, new_object: &str, superseded_by: chrono::DateTime<chrono::Utc>) -> Result<()> {
        let conn = self.writer.lock().expect("writer poisoned");
        conn.execute(
            "UPDATE fact SET valid_until = ?1, state = 'superseded'
             WHERE group_id = ?2 AND subject = ?3 AND predicate = ?4 AND object != ?5
               AND (valid_until IS NULL OR valid_until > ?1) AND valid_from < ?1",
            params![superseded_by.to_rfc3339(), group_id, subject, predicate, new_object],
        )
        .map_err(Error::from)?;
        Ok(())
    }

    pub fn get_fact(&self, uuid: &str) -> Result<Option<crate::model::Fact>> {
        let conn = self.reader.lock().expect("reader poisoned");
        conn.query_row(
            "SELECT uuid, group_id, subject, predicate, object, confidence, source_memory_ids, valid_from, valid_until, metadata, state, created_at
             FROM fact WHERE uuid = ?1",
            params![uuid],
            Self::row_to_fact,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Facts naming `entity_name_or_uri` as subject or object, ordered by
    /// `valid_from` descending so the most recent assertion comes first —
    /// used by "facts about Alice as of T" (spec §8 scenario B).
    pub fn facts_about(&self, group_id: &str, entity_name_or_uri: &str) -> Result<Vec<crate::model::Fact>> {
        let conn = self.reader.lock().expect("reader poisoned");
        let mut stmt = conn
            .prepare(
                "SELECT uuid, group_id, subject, predicate, object, confidence, source_memory_ids, valid_from, valid_until, metadata, state, created_at
                 FROM fact WHERE group_id = ?1 AND (subject = ?2 OR object = ?2) ORDER BY valid_from DESC",
            )
            .map_err(Error::from)?;
        let rows = stmt.query_map(params![group_id, entity_name_or_uri], Self::row_to_fact).map_err(Error::from)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    pub fn facts_by_group(&self, group_id: &str) -> Result<Vec<crate::model::Fact>> {
        let conn = self.reader.lock().expect("reader poisoned");
        let mut stmt = conn
            .prepare(
                "SELECT uuid, group_id, subject, predicate, object, confidence, source_memory_ids, valid_from, valid_until, metadata, state, created_at
                 FROM fact WHERE group_id = ?1",
            )
            .map_err(Error::from)?;
        let rows = stmt.query_map(params![group_id], Self::row_to_fact).map_err(Error::from)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    /// Distinct `group_id`s with at least one episode, for callers (the
    /// `/search` ingestion route) that need to fan out over every known
    /// group when none is named explicitly.
    pub fn all_group_ids(&self) -> Result<Vec<String>> {
        let conn = self.reader.lock().expect("reader poisoned");
        let mut stmt = conn.prepare("SELECT DISTINCT group_id FROM episodic ORDER BY group_id").map_err(Error::from)?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0)).map_err(Error::from)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    /// Wipes every node/edge table (the ingestion `/clear` route). Leaves
    /// the schema in place so the store stays usable afterward.
    pub fn clear_all(&self) -> Result<()> {
        let conn = self.writer.lock().expect("writer poisoned");
        conn.execute_batch(
            "DELETE FROM entity;
             DELETE FROM episodic;
             DELETE FROM community;
             DELETE FROM edge_mentions;
             DELETE FROM edge_relates_to;
             DELETE FROM edge_has_member;
             DELETE FROM fact;
             DELETE FROM session;
             DELETE FROM session_summary;",
        )
        .map_err(Error::from)
    }

    fn row_to_fact(row: &rusqlite::Row) -> rusqlite::Result<crate::model::Fact> {
        let source_memory_ids: String = row.get(6)?;
        let valid_until: Option<String> = row.get(8)?;
        let metadata: String = row.get(9)?;
        let state: String = row.get(10)?;
        Ok(crate::model::Fact {
            uuid: row.get::<_, String>(0)?.parse().unwrap_or_default(),
            group_id: row.get(1)?,
            subject: row.get(2)?,
            predicate: row.get(3)?,
            object: row.get(4)?,
            confidence: row.get(5)?,
            source_memory_ids: serde_json::from_str(&source_memory_ids).unwrap_or_default(),
            valid_from: row.get::<_, String>(7)?.parse().unwrap_or_else(|_| chrono::Utc::now()),
            valid_until: valid_until.and_then(|s| s.parse().ok()),
            metadata: serde_json::from_str(&metadata).unwrap_or_default(),
            state: parse_fact_state(&state),
            created_at: row.get::<_, String>(11)?.parse().unwrap_or_else(|_| chrono::Utc::now()),
        })
    }

    // -- prune (C12 retention policy) --

    /// Selects episode uuids eligible for pruning: `created_at < older_than`
    /// when given, skipping the newest `keep_recent` rows by `created_at`
    /// descending (spec §4.12).
    pub fn prunable_episodics(&self, group_id: Option<&str>, older_than: Option<chrono::DateTime<chrono::Utc>>, keep_recent: usize) -> Result<Vec<String>> {
        let conn = self.reader.lock().expect("reader poisoned");
        let (sql, group_bound): (String, Option<String>) = match group_id {
            Some(g) => ("SELECT uuid, created_at FROM episodic WHERE group_id = ?1 ORDER BY created_at DESC".to_string(), Some(g.to_string())),
            None => ("SELECT uuid, created_at FROM episodic ORDER BY created_at DESC".to_string(), None),
        };
        let mut stmt = conn.prepare(&sql).map_err(Error::from)?;
        let rows: Vec<(String, String)> = match &group_bound {
            Some(g) => stmt
                .query_map(params![g], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))
                .map_err(Error::from)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(Error::from)?,
            None => stmt
                .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))
                .map_err(Error::from)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(Error::from)?,
        };
        let candidates = rows.into_iter().skip(keep_recent);
        Ok(candidates
            .filter(|(_, created_at)| match older_than {
                Some(t) => created_at.parse::<chrono::DateTime<chrono::Utc>>().map(|c| c < t).unwrap_or(false),
                None => true,
            })
            .map(|(uuid, _)| uuid)
            .collect())
    }

    /// Edge-incidence counts keyed by node uuid, across all three edge
    /// types, used by the graph-boost rerank (spec §4.10).
    pub fn edge_counts(&self, group_id: &str) -> Result<std::collections::HashMap<uuid::Uuid, usize>> {
        let conn = self.reader.lock().expect("reader poisoned");
        let mut counts = std::collections::HashMap::new();
        for table in ["edge_mentions", "edge_relates_to", "edge_has_member"] {
            let sql = format!("SELECT source_uuid, target_uuid FROM {table} WHERE group_id = ?1");
            let mut stmt = conn.prepare(&sql).map_err(Error::from)?;
            let rows = stmt
                .query_map(params![group_id], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))
                .map_err(Error::from)?;
            for pair in rows {
                let (source, target) = pair.map_err(Error::from)?;
                if let Ok(id) = source.parse() {
                    *counts.entry(id).or_insert(0) += 1;
                }
                if let Ok(id) = target.parse() {
                    *counts.entry(id).or_insert(0) += 1;
                }
            }
        }
        Ok(counts)
    }

    // -- sessions (C11) --

    pub fn insert_session(&self, s: &crate::model::Session) -> Result<()> {
        let conn = self.writer.lock().expect("writer poisoned");
        conn.execute(
            "INSERT INTO session (session_id, user_id, metadata, created_at, last_active_at, memory_ids, summaries, state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(session_id) DO UPDATE SET
                last_active_at=excluded.last_active_at, memory_ids=excluded.memory_ids,
                summaries=excluded.summaries, state=excluded.state",
            params![
                s.session_id,
                s.user_id,
                serde_json::to_string(&s.metadata).unwrap(),
                s.created_at.to_rfc3339(),
                s.last_active_at.to_rfc3339(),
                serde_json::to_string(&s.memory_ids).unwrap(),
                serde_json::to_string(&s.summaries).unwrap(),
                session_state_str(s.state),
            ],
        )
        .map_err(Error::from)?;
        Ok(())
    }

    pub fn get_session(&self, session_id: &str) -> Result<Option<crate::model::Session>> {
        let conn = self.reader.lock().expect("reader poisoned");
        conn.query_row(
            "SELECT session_id, user_id, metadata, created_at, last_active_at, memory_ids, summaries, state
             FROM session WHERE session_id = ?1",
            params![session_id],
            Self::row_to_session,
        )
        .optional()
        .map_err(Error::from)
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<crate::model::Session> {
        let metadata: String = row.get(2)?;
        let created_at: String = row.get(3)?;
        let last_active_at: String = row.get(4)?;
        let memory_ids: String = row.get(5)?;
        let summaries: String = row.get(6)?;
        let state: String = row.get(7)?;
        Ok(crate::model::Session {
            session_id: row.get(0)?,
            user_id: row.get(1)?,
            metadata: serde_json::from_str(&metadata).unwrap_or_default(),
            created_at: created_at.parse().unwrap_or_else(|_| chrono::Utc::now()),
            last_active_at: last_active_at.parse().unwrap_or_else(|_| chrono::Utc::now()),
            memory_ids: serde_json::from_str(&memory_ids).unwrap_or_default(),
            summaries: serde_json::from_str(&summaries).unwrap_or_default(),
            state: parse_session_state(&state),
        })
    }

    pub fn insert_session_summary(&self, s: &crate::model::SessionSummary) -> Result<()> {
        let conn = self.writer.lock().expect("writer poisoned");
        conn.execute(
            "INSERT INTO session_summary (uuid, session_id, summary, start_time, end_time, message_count, entities, topics, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                s.uuid.to_string(),
                s.session_id,
                s.summary,
                s.start_time.to_rfc3339(),
                s.end_time.to_rfc3339(),
                s.message_count,
                serde_json::to_string(&s.entities).unwrap(),
                serde_json::to_string(&s.topics).unwrap(),
                s.created_at.to_rfc3339(),
            ],
        )
        .map_err(Error::from)?;
        Ok(())
    }

    /// `DETACH DELETE`: the session, its memories, their facts, and its
    /// summaries, in one transaction (spec §4.11).
    pub fn delete_session_detached(&self, session_id: &str) -> Result<()> {
        let session = self.get_session(session_id)?;
        let mut conn = self.writer.lock().expect("writer poisoned");
        let tx = conn.transaction().map_err(Error::from)?;
        if let Some(session) = &session {
            for memory_id in &session.memory_ids {
                let uuid = memory_id.to_string();
                tx.execute("DELETE FROM fact WHERE ?1 IN (SELECT value FROM json_each(source_memory_ids))", params![uuid])
                    .map_err(Error::from)?;
                tx.execute("DELETE FROM edge_mentions WHERE source_uuid = ?1", params![uuid])
                    .map_err(Error::from)?;
                tx.execute("DELETE FROM episodic WHERE uuid = ?1", params![uuid])
                    .map_err(Error::from)?;
            }
        }
        tx.execute("DELETE FROM session_summary WHERE session_id = ?1", params![session_id])
            .map_err(Error::from)?;
        tx.execute("DELETE FROM session WHERE session_id = ?1", params![session_id])
            .map_err(Error::from)?;
        tx.commit().map_err(Error::from)?;
        Ok(())
    }
}

fn fact_state_str(s: crate::model::FactState) -> &'static str {
    match s {
        crate::model::FactState::Asserted => "asserted",
        crate::model::FactState::Superseded => "superseded",
        crate::model::FactState::Retired => "retired",
        crate::model::FactState::Garbage => "garbage",
    }
}

fn parse_fact_state(s: &str) -> crate::model::FactState {
    match s {
        "superseded" => crate::model::FactState::Superseded,
        "retired" => crate::model::FactState::Retired,
        "garbage" => crate::model::FactState::Garbage,
        _ => crate::model::FactState::Asserted,
    }
}

fn session_state_str(s: crate::model::SessionState) -> &'static str {
    match s {
        crate::model::SessionState::Active => "active",
        crate::model::SessionState::Idle => "idle",
        crate::model::SessionState::Summarized => "summarized",
        crate::model::SessionState::Deleted => "deleted",
    }
}

fn parse_session_state(s: &str) -> crate::model::SessionState {
    match s {
        "idle" => crate::model::SessionState::Idle,
        "summarized" => crate::model::SessionState::Summarized,
        "deleted" => crate::model::SessionState::Deleted,
        _ => crate::model::SessionState::Active,
    }
}

fn episode_type_str(t: EpisodeType) -> &'static str {
    match t {
        EpisodeType::Message => "message",
        EpisodeType::Text => "text",
        EpisodeType::Json => "json",
    }
}

fn parse_episode_type(s: &str) -> EpisodeType {
    match s {
        "message" => EpisodeType::Message,
        "json" => EpisodeType::Json,
        _ => EpisodeType::Text,
    }
}

fn memory_type_str(t: crate::model::MemoryType) -> &'static str {
    match t {
        crate::model::MemoryType::Episodic => "episodic",
        crate::model::MemoryType::Semantic => "semantic",
        crate::model::MemoryType::Procedural => "procedural",
        crate::model::MemoryType::Summary => "summary",
    }
}

fn parse_memory_type(s: &str) -> crate::model::MemoryType {
    match s {
        "semantic" => crate::model::MemoryType::Semantic,
        "procedural" => crate::model::MemoryType::Procedural,
        "summary" => crate::model::MemoryType::Summary,
        _ => crate::model::MemoryType::Episodic,
    }
}

impl GraphStore for PropertyGraphStore {
    /// Interprets `MATCH (n:Label) WHERE n.prop = $param [AND ...] RETURN *`
    /// against the node tables. `Label` lower-cased names the table.
    fn execute_query(&self, pattern: &str, params: &Row) -> Result<Vec<super::Row>> {
        let parsed = parse_match(pattern)?;
        let table = parsed.label.to_lowercase();
        if !matches!(table.as_str(), "entity" | "episodic" | "community" | "fact" | "session") {
            return Err(Error::query_shape(format!("unknown label {table}"), (0, parsed.label.len())));
        }
        let mut sql = format!("SELECT * FROM {table}");
        let mut bind: Vec<Value> = Vec::new();
        if !parsed.conditions.is_empty() {
            let clauses: Vec<String> = parsed
                .conditions
                .iter()
                .map(|(col, param_name)| {
                    if param_name == "IS NOT NULL" {
                        format!("{col} IS NOT NULL")
                    } else {
                        bind.push(params.get(param_name).cloned().unwrap_or(Value::Null));
                        format!("{col} = ?{}", bind.len())
                    }
                })
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        if let Some(limit) = parsed.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let conn = self.reader.lock().expect("reader poisoned");
        let mut stmt = conn.prepare(&sql).map_err(Error::from)?;
        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let bind_values: Vec<rusqlite::types::Value> = bind.into_iter().map(value_to_sql).collect();
        let rows = stmt
            .query_map(rusqlite::params_from_iter(bind_values.iter()), |r| {
                let mut out = super::Row::new();
                for (i, name) in column_names.iter().enumerate() {
                    let v: rusqlite::types::Value = r.get(i)?;
                    out.insert(name.clone(), sql_to_value(v));
                }
                Ok(out)
            })
            .map_err(Error::from)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    /// Interprets `SET label.prop = $param WHERE uuid = $uuid` and
    /// `DETACH DELETE label WHERE uuid = $uuid`.
    fn mutate(&self, pattern: &str, params: &Row) -> Result<()> {
        let trimmed = pattern.trim();
        if let Some(rest) = trimmed.strip_prefix("DETACH DELETE ") {
            let label = rest.trim().to_lowercase();
            let uuid = params
                .get("uuid")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::query_shape("DETACH DELETE requires $uuid", (0, 0)))?;
            match label.as_str() {
                "episodic" => self.delete_episodic_detached(uuid),
                "entity" | "community" => {
                    let conn = self.writer.lock().expect("writer poisoned");
                    conn.execute(&format!("DELETE FROM {label} WHERE uuid = ?1"), params![uuid])
                        .map_err(Error::from)?;
                    Ok(())
                }
                other => Err(Error::query_shape(format!("unknown label {other}"), (0, 0))),
            }
        } else if trimmed.starts_with("SET ") {
            Err(Error::query_shape("SET patterns are not interpreted generically; use a typed method", (0, 0)))
        } else {
            Err(Error::query_shape("unrecognized mutation pattern", (0, trimmed.len())))
        }
    }

    fn create_indexes(&self) -> Result<()> {
        self.apply_migrations()
    }

    fn verify_connectivity(&self) -> Result<()> {
        let conn = self.reader.lock().expect("reader poisoned");
        conn.query_row("SELECT 1", [], |_| Ok(())).map_err(Error::from)?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct ParsedMatch {
    label: String,
    conditions: Vec<(String, String)>,
    limit: Option<u32>,
}

/// Parses `MATCH (n:Label) [WHERE n.col = $param [AND n.col2 IS NOT NULL]] [RETURN *] [LIMIT n]`.
/// This is the bounded subset spec §4.4 names — single-hop match, equality
/// and `IS NOT NULL` in `WHERE`, and `ORDER BY ... LIMIT` (ordering is
/// delegated to callers via the typed methods; only `LIMIT` is honored here).
fn parse_match(pattern: &str) -> Result<ParsedMatch> {
    let pattern = pattern.trim();
    let label_start = pattern
        .find(':')
        .ok_or_else(|| Error::query_shape("expected MATCH (var:Label)", (0, pattern.len())))?;
    let label_end = pattern[label_start..]
        .find(|c: char| c == ')' || c == ' ' || c == '{')
        .map(|i| label_start + i)
        .unwrap_or(pattern.len());
    let label = pattern[label_start + 1..label_end].trim().to_string();

    let mut conditions = Vec::new();
    if let Some(where_idx) = pattern.find("WHERE") {
        let clause_end = pattern.find("RETURN").unwrap_or(pattern.len());
        let clause_end = pattern[..clause_end].find("LIMIT").unwrap_or(clause_end);
        let clause = &pattern[where_idx + "WHERE".len()..clause_end];
        for part in clause.split("AND") {
            let part = part.trim();
            if let Some(stripped) = part.strip_suffix("IS NOT NULL") {
                let col = stripped.trim().trim_start_matches("n.").to_string();
                conditions.push((col, "IS NOT NULL".to_string()));
            } else if let Some((lhs, rhs)) = part.split_once('=') {
                let col = lhs.trim().trim_start_matches("n.").to_string();
                let param = rhs.trim().trim_start_matches('$').to_string();
                conditions.push((col, param));
            }
        }
    }

    let limit = pattern
        .find("LIMIT")
        .and_then(|i| pattern[i + "LIMIT".len()..].trim().split_whitespace().next())
        .and_then(|s| s.parse().ok());

    Ok(ParsedMatch { label, conditions, limit })
}

fn value_to_sql(v: Value) -> rusqlite::types::Value {
    match v {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                rusqlite::types::Value::Integer(i)
            } else {
                rusqlite::types::Value::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => rusqlite::types::Value::Text(s),
        other => rusqlite::types::Value::Text(other.to_string()),
    }
}

fn sql_to_value(v: rusqlite::types::Value) -> Value {
    match v {
        rusqlite::types::Value::Null => Value::Null,
        rusqlite::types::Value::Integer(i) => Value::from(i),
        rusqlite::types::Value::Real(f) => serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        rusqlite::types::Value::Text(s) => Value::String(s),
        rusqlite::types::Value::Blob(b) => Value::String(format!("{b:x?}")),
    }
}
