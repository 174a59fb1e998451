//! Graph data model (C3) — sessions and session summaries
//!
//! Owned exclusively by [`crate::session`]'s `SessionManager`. A `Session`
//! accumulates `memory_ids` in arrival order; summaries are range-bounded
//! and exclusively owned by their session (spec §3 ownership notes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Lifecycle state per spec §9: `active -> idle -> summarized -> deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Idle,
    Summarized,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    /// Arrival-ordered; never deduplicated or reordered.
    pub memory_ids: Vec<Uuid>,
    pub summaries: Vec<Uuid>,
    pub state: SessionState,
}

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            user_id: None,
            metadata: HashMap::new(),
            created_at: now,
            last_active_at: now,
            memory_ids: Vec::new(),
            summaries: Vec::new(),
            state: SessionState::Active,
        }
    }

    /// Appends a memory and bumps `last_active_at`. The caller supplies
    /// `at` so the clock under test can be swapped for a fixed one.
    pub fn add_memory(&mut self, memory_id: Uuid, at: DateTime<Utc>) {
        self.memory_ids.push(memory_id);
        if at > self.last_active_at {
            self.last_active_at = at;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub uuid: Uuid,
    pub session_id: String,
    pub summary: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub message_count: u32,
    pub entities: Vec<String>,
    pub topics: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionSummary {
    pub fn new(
        session_id: impl Into<String>,
        summary: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        message_count: u32,
    ) -> Self {
        Self {
            uuid: crate::time::new_uuid(),
            session_id: session_id.into(),
            summary: summary.into(),
            start_time,
            end_time,
            message_count,
            entities: Vec::new(),
            topics: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// `start_time <= end_time`, `message_count >= 1`.
    pub fn is_well_formed(&self) -> bool {
        self.start_time <= self.end_time && self.message_count >= 1
    }
}
