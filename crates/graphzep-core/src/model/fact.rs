//! Graph data model (C3) — reified facts
//!
//! A `Fact` is a subject–predicate–object assertion with confidence and
//! provenance bookkeeping, reified so it can be queried independently of the
//! unreified triple it corresponds to on the RDF path (see
//! [`crate::rdf_mapper`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Lifecycle state per spec §9's state machine: `asserted -> superseded ->
/// retired -> garbage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactState {
    Asserted,
    Superseded,
    Retired,
    Garbage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    pub uuid: Uuid,
    pub group_id: String,
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub confidence: f32,
    pub source_memory_ids: HashSet<Uuid>,
    pub valid_from: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, String>,
    pub state: FactState,
    pub created_at: DateTime<Utc>,
}

impl Fact {
    pub fn new(
        group_id: impl Into<String>,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        confidence: f32,
        valid_from: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid: crate::time::new_uuid(),
            group_id: group_id.into(),
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source_memory_ids: HashSet::new(),
            valid_from,
            valid_until: None,
            metadata: HashMap::new(),
            state: FactState::Asserted,
            created_at: Utc::now(),
        }
    }

    /// `(subject, predicate, object)` identifies the underlying unreified
    /// triple; a new assertion with the same key and overlapping validity
    /// supersedes this one rather than duplicating it.
    pub fn triple_key(&self) -> (String, String, String) {
        (self.subject.clone(), self.predicate.clone(), self.object.clone())
    }

    /// `valid_from <= valid_until` when both are present.
    pub fn is_well_formed(&self) -> bool {
        self.valid_until.map(|u| self.valid_from <= u).unwrap_or(true)
    }

    /// Live iff `valid_from <= t < (valid_until v +inf)`.
    pub fn is_live_at(&self, t: DateTime<Utc>) -> bool {
        self.valid_from <= t && self.valid_until.map(|u| t < u).unwrap_or(true)
    }

    /// A fact with no live source episode becomes unsourced and must be
    /// garbage-collected (spec §3, ownership notes).
    pub fn is_unsourced(&self) -> bool {
        self.source_memory_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn confidence_is_clamped_to_unit_interval() {
        let f = Fact::new("g", "alice", "worksAt", "acme", 1.5, Utc::now());
        assert_eq!(f.confidence, 1.0);
        let f2 = Fact::new("g", "alice", "worksAt", "acme", -0.2, Utc::now());
        assert_eq!(f2.confidence, 0.0);
    }

    #[test]
    fn triple_key_ignores_confidence_and_validity() {
        let now = Utc::now();
        let a = Fact::new("g", "alice", "worksAt", "acme", 0.9, now);
        let b = Fact::new("g", "alice", "worksAt", "acme", 0.2, now + Duration::days(1));
        assert_eq!(a.triple_key(), b.triple_key());
    }

    #[test]
    fn unsourced_fact_has_no_live_episodes() {
        let f = Fact::new("g", "alice", "worksAt", "acme", 0.9, Utc::now());
        assert!(f.is_unsourced());
    }

    #[test]
    fn liveness_respects_half_open_validity() {
        let now = Utc::now();
        let mut f = Fact::new("g", "a", "p", "o", 0.8, now);
        f.valid_until = Some(now + Duration::days(1));
        assert!(f.is_live_at(now));
        assert!(!f.is_live_at(now + Duration::days(1)));
    }
}
