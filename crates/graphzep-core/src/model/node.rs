//! Graph data model (C3) — nodes
//!
//! An exhaustive sum type rather than a single struct generalized across
//! node "kinds" via a `node_type: String` field, per the REDESIGN FLAGS in
//! spec §9: "Replace with a sum type `Node = Entity | Episodic |
//! Community`. Dispatch via exhaustive pattern matching."

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// A durable participant: person, place, organization, or concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub uuid: Uuid,
    pub name: String,
    pub group_id: String,
    pub entity_type: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_embedding: Option<Vec<f32>>,
    pub fact_ids: HashSet<Uuid>,
    pub labels: HashSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity {
    /// The `(name, group_id)` key extraction must dedup on.
    pub fn dedup_key(&self) -> (String, String) {
        (self.name.clone(), self.group_id.clone())
    }

    pub fn new(name: impl Into<String>, group_id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        let mut labels = HashSet::new();
        labels.insert("Entity".to_string());
        Self {
            uuid: crate::time::new_uuid(),
            name: name.into(),
            group_id: group_id.into(),
            entity_type: entity_type.into(),
            summary: String::new(),
            summary_embedding: None,
            fact_ids: HashSet::new(),
            labels,
            created_at: Utc::now(),
        }
    }
}

/// A single ingestion event (utterance, document, structured record).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episodic {
    pub uuid: Uuid,
    pub name: String,
    pub group_id: String,
    pub episode_type: EpisodeType,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub valid_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Incremented atomically by `get_memory` (spec testable property 8).
    pub access_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<DateTime<Utc>>,
    /// Classification used by the retrieval engine's `memory_types` filter
    /// (spec §4.10). Independent of `episode_type`, which describes the
    /// payload shape rather than the memory's role.
    pub memory_type: MemoryType,
}

/// Episode payload kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeType {
    Message,
    Text,
    Json,
}

/// Retrieval's `memory_types` filter operates over this classification
/// (spec §4.10). Extraction (C9) runs only for `Episodic`/`Semantic`
/// memories (spec §4.12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    Episodic,
    Semantic,
    Procedural,
    Summary,
}

impl Default for MemoryType {
    fn default() -> Self {
        MemoryType::Episodic
    }
}

impl Episodic {
    pub fn new(
        name: impl Into<String>,
        group_id: impl Into<String>,
        episode_type: EpisodeType,
        content: impl Into<String>,
        valid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid: crate::time::new_uuid(),
            name: name.into(),
            group_id: group_id.into(),
            episode_type,
            content: content.into(),
            embedding: None,
            valid_at,
            invalid_at: None,
            reference_id: None,
            created_at: Utc::now(),
            access_count: 0,
            last_accessed_at: None,
            memory_type: MemoryType::Episodic,
        }
    }

    /// `valid_at <= invalid_at` when both present.
    pub fn is_well_formed(&self) -> bool {
        self.invalid_at.map(|i| self.valid_at <= i).unwrap_or(true)
    }

    pub fn is_retracted_at(&self, t: DateTime<Utc>) -> bool {
        self.invalid_at.map(|i| t >= i).unwrap_or(false)
    }
}

/// An aggregated cluster of entities, discovered by community detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub uuid: Uuid,
    pub name: String,
    pub group_id: String,
    pub community_level: u32,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_embedding: Option<Vec<f32>>,
    pub fact_ids: HashSet<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Community {
    pub fn new(name: impl Into<String>, group_id: impl Into<String>, community_level: u32) -> Self {
        Self {
            uuid: crate::time::new_uuid(),
            name: name.into(),
            group_id: group_id.into(),
            community_level,
            summary: String::new(),
            summary_embedding: None,
            fact_ids: HashSet::new(),
            created_at: Utc::now(),
        }
    }
}

/// Sum type over the three node variants. Dispatch (persistence, deletion)
/// is exhaustive pattern matching, never downcasting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Node {
    Entity(Entity),
    Episodic(Episodic),
    Community(Community),
}

impl Node {
    pub fn uuid(&self) -> Uuid {
        match self {
            Node::Entity(e) => e.uuid,
            Node::Episodic(e) => e.uuid,
            Node::Community(c) => c.uuid,
        }
    }

    pub fn group_id(&self) -> &str {
        match self {
            Node::Entity(e) => &e.group_id,
            Node::Episodic(e) => &e.group_id,
            Node::Community(c) => &c.group_id,
        }
    }

    /// Labels prepended automatically on construction ("Entity", "Episodic",
    /// or "Community").
    pub fn label(&self) -> &'static str {
        match self {
            Node::Entity(_) => "Entity",
            Node::Episodic(_) => "Episodic",
            Node::Community(_) => "Community",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_dedup_key_is_name_and_group() {
        let e = Entity::new("Alice", "group-1", "person");
        assert_eq!(e.dedup_key(), ("Alice".to_string(), "group-1".to_string()));
    }

    #[test]
    fn entity_carries_entity_label() {
        let e = Entity::new("Alice", "group-1", "person");
        assert!(e.labels.contains("Entity"));
    }

    #[test]
    fn episode_well_formed_requires_valid_before_invalid() {
        let now = Utc::now();
        let mut ep = Episodic::new("msg", "g", EpisodeType::Message, "hi", now);
        assert!(ep.is_well_formed());
        ep.invalid_at = Some(now - chrono::Duration::seconds(1));
        assert!(!ep.is_well_formed());
    }

    #[test]
    fn node_dispatch_is_exhaustive_by_variant() {
        let n = Node::Entity(Entity::new("Bob", "g", "person"));
        assert_eq!(n.label(), "Entity");
        let n2 = Node::Community(Community::new("cluster", "g", 0));
        assert_eq!(n2.label(), "Community");
    }
}
