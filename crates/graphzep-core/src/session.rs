//! Session manager (C11)
//!
//! Session lifecycle (`create_session`, `get_session`, `add_memory_to_session`,
//! `delete_session`) and range-bounded summary generation
//! (`generate_session_summary`), per spec §4.11. A thin layer over
//! [`PropertyGraphStore`] plus the language adapter, orchestrating a
//! multi-step operation without owning persistence itself.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::adapters::language::complete_structured_with_retry;
use crate::adapters::LanguageClient;
use crate::error::{Error, Result};
use crate::model::{Episodic, Session, SessionSummary};
use crate::storage::property_graph::PropertyGraphStore;
use crate::time::Clock;

/// Parameters for `create_session` (spec §4.11).
#[derive(Debug, Clone, Default)]
pub struct CreateSessionParams {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// Parameters for `generate_session_summary` (spec §4.11).
#[derive(Debug, Clone, Default)]
pub struct SummaryParams {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub max_messages: Option<usize>,
}

/// Schema advertised to the language adapter for entity/topic extraction
/// over a session's summary text.
fn topics_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["entities", "topics"],
        "properties": {
            "entities": { "type": "array", "items": { "type": "string" } },
            "topics": { "type": "array", "items": { "type": "string" } }
        }
    })
}

#[derive(Debug, Default, serde::Deserialize)]
struct EntitiesAndTopics {
    #[serde(default)]
    entities: Vec<String>,
    #[serde(default)]
    topics: Vec<String>,
}

pub struct SessionManager<'a> {
    pub store: &'a PropertyGraphStore,
    pub language: &'a dyn LanguageClient,
    pub clock: &'a dyn Clock,
}

impl<'a> SessionManager<'a> {
    pub fn new(store: &'a PropertyGraphStore, language: &'a dyn LanguageClient, clock: &'a dyn Clock) -> Self {
        Self { store, language, clock }
    }

    pub fn create_session(&self, params: CreateSessionParams) -> Result<Session> {
        let session_id = params.session_id.unwrap_or_else(|| crate::time::new_uuid().to_string());
        if let Some(existing) = self.store.get_session(&session_id)? {
            return Ok(existing);
        }
        let mut session = Session::new(session_id);
        session.user_id = params.user_id;
        session.metadata = params.metadata;
        self.store.insert_session(&session)?;
        Ok(session)
    }

    pub fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        self.store.get_session(session_id)
    }

    /// Creates a `has-memory` relation (recorded as the session's ordered
    /// `memory_ids`) and bumps `last_active_at` to the memory's
    /// `created_at`, never rewinding it (spec testable property 2).
    pub fn add_memory_to_session(&self, session_id: &str, memory: &Episodic) -> Result<Session> {
        let mut session = self
            .store
            .get_session(session_id)?
            .ok_or_else(|| Error::not_found(format!("session {session_id} not found")))?;
        session.add_memory(memory.uuid, memory.created_at);
        self.store.insert_session(&session)?;
        Ok(session)
    }

    /// Fetches memories ordered by `created_at` ascending within
    /// `[start, end]`, feeds their concatenation to the language adapter
    /// under a "summarize" prompt, separately extracts entities/topics
    /// under [`topics_schema`], and persists the resulting summary.
    pub async fn generate_session_summary(&self, session_id: &str, params: SummaryParams) -> Result<SessionSummary> {
        let session = self
            .store
            .get_session(session_id)?
            .ok_or_else(|| Error::not_found(format!("session {session_id} not found")))?;

        let mut memories: Vec<Episodic> = session
            .memory_ids
            .iter()
            .filter_map(|id| self.store.get_episodic(&id.to_string()).ok().flatten())
            .filter(|m| params.start.map(|s| m.created_at >= s).unwrap_or(true))
            .filter(|m| params.end.map(|e| m.created_at <= e).unwrap_or(true))
            .collect();
        memories.sort_by_key(|m| m.created_at);
        if let Some(max) = params.max_messages {
            memories.truncate(max);
        }
        if memories.is_empty() {
            return Err(Error::validation("no memories in the requested range to summarize"));
        }

        let concatenated = memories.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join("\n");
        let summary_prompt = format!("Summarize the following conversation:\n{concatenated}");
        let summary_schema = json!({ "type": "object", "required": ["summary"], "properties": { "summary": { "type": "string" } } });
        let summary_value = complete_structured_with_retry(self.language, &summary_prompt, &summary_schema).await?;
        let summary_text = summary_value
            .get("summary")
            .and_then(|v| v.as_str())
            .unwrap_or(&concatenated)
            .to_string();

        let topics_value = complete_structured_with_retry(self.language, &concatenated, &topics_schema())
            .await
            .unwrap_or_else(|_| json!({ "entities": [], "topics": [] }));
        let extracted: EntitiesAndTopics = serde_json::from_value(topics_value).unwrap_or_default();

        let start_time = memories.first().expect("checked non-empty above").created_at;
        let end_time = memories.last().expect("checked non-empty above").created_at;
        let mut summary = SessionSummary::new(session_id, summary_text, start_time, end_time, memories.len() as u32);
        summary.entities = extracted.entities;
        summary.topics = extracted.topics;

        self.store.insert_session_summary(&summary)?;
        let mut session = session;
        session.summaries.push(summary.uuid);
        self.store.insert_session(&session)?;
        Ok(summary)
    }

    /// Detach-deletes the session, its memories, their facts, and its
    /// summaries in one mutation.
    pub fn delete_session(&self, session_id: &str) -> Result<()> {
        self.store.delete_session_detached(session_id)
    }

    #[allow(dead_code)]
    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockLanguageClient;
    use crate::model::EpisodeType;
    use crate::time::SystemClock;

    fn manager(store: &PropertyGraphStore, lang: &dyn LanguageClient) -> SessionManager<'_> {
        SessionManager::new(store, lang, &SystemClock)
    }

    #[test]
    fn create_session_is_idempotent_on_explicit_id() {
        let store = PropertyGraphStore::open(None).unwrap();
        let lang = MockLanguageClient::new();
        let mgr = manager(&store, &lang);
        let a = mgr
            .create_session(CreateSessionParams {
                session_id: Some("sess-1".to_string()),
                ..Default::default()
            })
            .unwrap();
        let b = mgr
            .create_session(CreateSessionParams {
                session_id: Some("sess-1".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(a.created_at, b.created_at);
    }

    #[test]
    fn adding_memories_keeps_created_at_non_decreasing() {
        let store = PropertyGraphStore::open(None).unwrap();
        let lang = MockLanguageClient::new();
        let mgr = manager(&store, &lang);
        mgr.create_session(CreateSessionParams {
            session_id: Some("sess-1".to_string()),
            ..Default::default()
        })
        .unwrap();

        let now = Utc::now();
        let m1 = Episodic::new("m1", "group-1", EpisodeType::Message, "hi", now);
        let m2 = Episodic::new("m2", "group-1", EpisodeType::Message, "there", now + chrono::Duration::seconds(5));
        mgr.add_memory_to_session("sess-1", &m1).unwrap();
        let session = mgr.add_memory_to_session("sess-1", &m2).unwrap();
        assert_eq!(session.memory_ids, vec![m1.uuid, m2.uuid]);
        assert!(session.last_active_at >= m2.created_at);
    }

    #[tokio::test]
    async fn generate_summary_covers_exactly_the_requested_range() {
        let store = PropertyGraphStore::open(None).unwrap();
        let lang = MockLanguageClient::new();
        let mgr = manager(&store, &lang);
        mgr.create_session(CreateSessionParams {
            session_id: Some("sess-1".to_string()),
            ..Default::default()
        })
        .unwrap();

        let t0 = Utc::now();
        for (i, offset) in [0, 1, 2].into_iter().enumerate() {
            let mut m = Episodic::new(format!("m{i}"), "group-1", EpisodeType::Message, "hello", t0);
            m.created_at = t0 + chrono::Duration::hours(offset);
            store.insert_episodic(&m).unwrap();
            mgr.add_memory_to_session("sess-1", &m).unwrap();
        }

        let summary = mgr
            .generate_session_summary(
                "sess-1",
                SummaryParams {
                    start: Some(t0),
                    end: Some(t0 + chrono::Duration::hours(1)),
                    max_messages: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(summary.message_count, 2);
        assert!(summary.is_well_formed());
    }

    #[test]
    fn delete_session_removes_everything_it_owns() {
        let store = PropertyGraphStore::open(None).unwrap();
        let lang = MockLanguageClient::new();
        let mgr = manager(&store, &lang);
        mgr.create_session(CreateSessionParams {
            session_id: Some("sess-1".to_string()),
            ..Default::default()
        })
        .unwrap();
        mgr.delete_session("sess-1").unwrap();
        assert!(mgr.get_session("sess-1").unwrap().is_none());
    }
}
