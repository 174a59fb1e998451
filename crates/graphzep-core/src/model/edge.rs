//! Graph data model (C3) — edges
//!
//! Sum type `Edge = Mentions | RelatesTo | HasMember`, per the REDESIGN
//! FLAGS of spec §9. All three variants share `{uuid, group_id,
//! source_uuid, target_uuid, created_at}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Fields shared by every edge variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeCommon {
    pub uuid: Uuid,
    pub group_id: String,
    pub source_uuid: Uuid,
    pub target_uuid: Uuid,
    pub created_at: DateTime<Utc>,
}

impl EdgeCommon {
    fn new(group_id: impl Into<String>, source_uuid: Uuid, target_uuid: Uuid) -> Self {
        Self {
            uuid: crate::time::new_uuid(),
            group_id: group_id.into(),
            source_uuid,
            target_uuid,
            created_at: Utc::now(),
        }
    }
}

/// Episodic → Entity: the episode mentions the entity. No further attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mentions {
    #[serde(flatten)]
    pub common: EdgeCommon,
}

impl Mentions {
    pub fn new(group_id: impl Into<String>, episode_uuid: Uuid, entity_uuid: Uuid) -> Self {
        Self {
            common: EdgeCommon::new(group_id, episode_uuid, entity_uuid),
        }
    }
}

/// Entity → Entity: a directed, named relation asserted by one or more
/// episodes, with its own temporal validity independent of its endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatesTo {
    #[serde(flatten)]
    pub common: EdgeCommon,
    pub name: String,
    pub fact_ids: HashSet<Uuid>,
    pub episodes: HashSet<Uuid>,
    pub valid_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<DateTime<Utc>>,
}

impl RelatesTo {
    pub fn new(
        group_id: impl Into<String>,
        source_uuid: Uuid,
        target_uuid: Uuid,
        name: impl Into<String>,
        valid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            common: EdgeCommon::new(group_id, source_uuid, target_uuid),
            name: name.into(),
            fact_ids: HashSet::new(),
            episodes: HashSet::new(),
            valid_at,
            invalid_at: None,
            expired_at: None,
        }
    }

    /// `(source_uuid, target_uuid, name)` is the dedup key within a group.
    pub fn dedup_key(&self) -> (Uuid, Uuid, String) {
        (self.common.source_uuid, self.common.target_uuid, self.name.clone())
    }

    pub fn is_live_at(&self, t: DateTime<Utc>) -> bool {
        self.valid_at <= t && self.invalid_at.map(|i| t < i).unwrap_or(true)
    }
}

/// Community → Entity: cluster membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HasMember {
    #[serde(flatten)]
    pub common: EdgeCommon,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact_ids: Option<HashSet<Uuid>>,
}

impl HasMember {
    pub fn new(
        group_id: impl Into<String>,
        community_uuid: Uuid,
        entity_uuid: Uuid,
        name: impl Into<String>,
    ) -> Self {
        Self {
            common: EdgeCommon::new(group_id, community_uuid, entity_uuid),
            name: name.into(),
            description: None,
            fact_ids: None,
        }
    }
}

/// Sum type over the three edge variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Edge {
    Mentions(Mentions),
    RelatesTo(RelatesTo),
    HasMember(HasMember),
}

impl Edge {
    pub fn common(&self) -> &EdgeCommon {
        match self {
            Edge::Mentions(m) => &m.common,
            Edge::RelatesTo(r) => &r.common,
            Edge::HasMember(h) => &h.common,
        }
    }

    pub fn relation_label(&self) -> &'static str {
        match self {
            Edge::Mentions(_) => "MENTIONS",
            Edge::RelatesTo(_) => "RELATES_TO",
            Edge::HasMember(_) => "HAS_MEMBER",
        }
    }
}
