//! Schema migrations for [`super::property_graph::PropertyGraphStore`].
//!
//! A `Migration { version, description, up }` table applied in order
//! inside a single transaction by `PropertyGraphStore::new`.

/// Ordered schema migrations.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Labelled-property layout: Entity/Episodic/Community nodes, \
                  Mentions/RelatesTo/HasMember edges, Fact/Session/SessionSummary",
    up: MIGRATION_V1_UP,
}];

/// A single forward-only schema migration.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS entity (
    uuid TEXT PRIMARY KEY,
    group_id TEXT NOT NULL,
    name TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    summary_embedding TEXT,
    fact_ids TEXT NOT NULL DEFAULT '[]',
    labels TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS episodic (
    uuid TEXT PRIMARY KEY,
    group_id TEXT NOT NULL,
    name TEXT NOT NULL,
    episode_type TEXT NOT NULL,
    content TEXT NOT NULL,
    embedding TEXT,
    valid_at TEXT NOT NULL,
    invalid_at TEXT,
    reference_id TEXT,
    created_at TEXT NOT NULL,
    access_count INTEGER NOT NULL DEFAULT 0,
    last_accessed_at TEXT,
    memory_type TEXT NOT NULL DEFAULT 'episodic'
);

CREATE TABLE IF NOT EXISTS community (
    uuid TEXT PRIMARY KEY,
    group_id TEXT NOT NULL,
    name TEXT NOT NULL,
    community_level INTEGER NOT NULL DEFAULT 0,
    summary TEXT NOT NULL DEFAULT '',
    summary_embedding TEXT,
    fact_ids TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS edge_mentions (
    uuid TEXT PRIMARY KEY,
    group_id TEXT NOT NULL,
    source_uuid TEXT NOT NULL,
    target_uuid TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS edge_relates_to (
    uuid TEXT PRIMARY KEY,
    group_id TEXT NOT NULL,
    source_uuid TEXT NOT NULL,
    target_uuid TEXT NOT NULL,
    name TEXT NOT NULL,
    fact_ids TEXT NOT NULL DEFAULT '[]',
    episodes TEXT NOT NULL DEFAULT '[]',
    valid_at TEXT NOT NULL,
    invalid_at TEXT,
    expired_at TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (group_id, source_uuid, target_uuid, name)
);

CREATE TABLE IF NOT EXISTS edge_has_member (
    uuid TEXT PRIMARY KEY,
    group_id TEXT NOT NULL,
    source_uuid TEXT NOT NULL,
    target_uuid TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    fact_ids TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fact (
    uuid TEXT PRIMARY KEY,
    group_id TEXT NOT NULL,
    subject TEXT NOT NULL,
    predicate TEXT NOT NULL,
    object TEXT NOT NULL,
    confidence REAL NOT NULL,
    source_memory_ids TEXT NOT NULL DEFAULT '[]',
    valid_from TEXT NOT NULL,
    valid_until TEXT,
    metadata TEXT NOT NULL DEFAULT '{}',
    state TEXT NOT NULL DEFAULT 'asserted',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS session (
    session_id TEXT PRIMARY KEY,
    user_id TEXT,
    metadata TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    last_active_at TEXT NOT NULL,
    memory_ids TEXT NOT NULL DEFAULT '[]',
    summaries TEXT NOT NULL DEFAULT '[]',
    state TEXT NOT NULL DEFAULT 'active'
);

CREATE TABLE IF NOT EXISTS session_summary (
    uuid TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    summary TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    message_count INTEGER NOT NULL,
    entities TEXT NOT NULL DEFAULT '[]',
    topics TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entity_group_id ON entity (group_id);
CREATE INDEX IF NOT EXISTS idx_episodic_group_id ON episodic (group_id);
CREATE INDEX IF NOT EXISTS idx_community_group_id ON community (group_id);
CREATE INDEX IF NOT EXISTS idx_fact_group_id ON fact (group_id);
CREATE INDEX IF NOT EXISTS idx_edge_mentions_source ON edge_mentions (source_uuid);
CREATE INDEX IF NOT EXISTS idx_edge_relates_to_source ON edge_relates_to (source_uuid);
CREATE INDEX IF NOT EXISTS idx_edge_has_member_source ON edge_has_member (source_uuid);
"#;
