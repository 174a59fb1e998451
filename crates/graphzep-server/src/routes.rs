//! Request/response shapes and handlers for the ingestion HTTP surface
//! (spec §6). Bodies use `snake_case` fields matching the literal shapes in
//! the spec's table (`group_id`, `role_type`, `max_facts`, ...).

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use graphzep_core::memory_manager::AddMemoryParams;
use graphzep_core::model::{Episodic, EpisodeType, Fact, MemoryType};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthcheckResponse {
    pub status: &'static str,
}

pub async fn healthcheck() -> Json<HealthcheckResponse> {
    Json(HealthcheckResponse { status: "ok" })
}

// -- POST /messages --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    User,
    Assistant,
    System,
}

#[derive(Debug, Deserialize)]
pub struct MessageIn {
    pub content: String,
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub role_type: RoleType,
    pub role: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub source_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessagesRequest {
    pub group_id: String,
    pub messages: Vec<MessageIn>,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub success: bool,
    pub message: String,
}

/// Enqueues every message onto the single-worker FIFO queue (spec §5) so
/// ingestion order within `group_id` is preserved, then waits for all of
/// them to persist before replying.
pub async fn post_messages(
    State(state): State<AppState>,
    Json(body): Json<MessagesRequest>,
) -> Result<(StatusCode, Json<MessagesResponse>), ApiError> {
    if body.messages.is_empty() {
        return Err(ApiError(graphzep_core::Error::validation("messages must not be empty").with_field("messages")));
    }

    let mut receivers = Vec::with_capacity(body.messages.len());
    for message in &body.messages {
        let mut metadata = HashMap::new();
        metadata.insert("role_type".to_string(), format!("{:?}", message.role_type).to_lowercase());
        if let Some(role) = &message.role {
            metadata.insert("role".to_string(), role.clone());
        }
        if let Some(name) = &message.name {
            metadata.insert("name".to_string(), name.clone());
        }
        if let Some(source) = &message.source_description {
            metadata.insert("source_description".to_string(), source.clone());
        }

        let params = AddMemoryParams {
            content: message.content.clone(),
            group_id: body.group_id.clone(),
            session_id: None,
            memory_type: MemoryType::Episodic,
            episode_type: EpisodeType::Message,
            valid_at: Some(message.timestamp),
            metadata,
            reference_id: message.uuid.clone(),
        };
        receivers.push(state.queue.enqueue(params));
    }

    for receiver in receivers {
        receiver
            .await
            .map_err(|_| graphzep_core::Error::backend("ingestion worker shut down"))??;
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(MessagesResponse {
            success: true,
            message: "messages queued".to_string(),
        }),
    ))
}

// -- facts / FactResult shared by /search and /get-memory --

#[derive(Debug, Serialize)]
pub struct FactResult {
    pub uuid: String,
    pub name: String,
    pub fact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<DateTime<Utc>>,
}

impl From<&Fact> for FactResult {
    fn from(f: &Fact) -> Self {
        FactResult {
            uuid: f.uuid.to_string(),
            name: f.predicate.clone(),
            fact: format!("{} {} {}", f.subject, f.predicate, f.object),
            valid_at: Some(f.valid_from),
            invalid_at: f.valid_until,
            created_at: f.created_at,
            expired_at: None,
        }
    }
}

/// Case-insensitive keyword relevance over a fact's `subject predicate
/// object` text, used to rank facts for `/search` and `/get-memory` the
/// same way spec §4.10's keyword search ranks memory content: a
/// substring hit, ties broken by descending confidence then recency.
fn score_fact(fact: &Fact, query_lower: &str) -> Option<(std::cmp::Reverse<i64>, Fact)> {
    let haystack = format!("{} {} {}", fact.subject, fact.predicate, fact.object).to_lowercase();
    if query_lower.is_empty() || haystack.contains(query_lower) {
        let key = (fact.confidence * 1000.0) as i64;
        Some((std::cmp::Reverse(key), fact.clone()))
    } else {
        None
    }
}

/// Ranked facts matching `query`, scoped to `group_ids` (every group when
/// empty). Returns the raw [`Fact`]s rather than [`FactResult`]s so callers
/// that need to filter by graph proximity (`/get-memory`'s
/// `center_node_uuid`) can do so against `subject`/`object` before the
/// lossy string formatting.
fn search_facts_raw(state: &AppState, group_ids: &[String], query: &str, max_facts: usize) -> Result<Vec<Fact>, graphzep_core::Error> {
    let query_lower = query.to_lowercase();
    let groups: Vec<String> = if group_ids.is_empty() { state.engine.all_group_ids()? } else { group_ids.to_vec() };

    let mut scored: Vec<(std::cmp::Reverse<i64>, Fact)> = Vec::new();
    for group_id in groups {
        for fact in state.engine.facts_by_group(&group_id)? {
            if let Some(entry) = score_fact(&fact, &query_lower) {
                scored.push(entry);
            }
        }
    }
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.created_at.cmp(&a.1.created_at)));
    Ok(scored.into_iter().take(max_facts).map(|(_, f)| f).collect())
}

fn search_facts(state: &AppState, group_ids: &[String], query: &str, max_facts: usize) -> Result<Vec<FactResult>, graphzep_core::Error> {
    Ok(search_facts_raw(state, group_ids, query, max_facts)?.iter().map(FactResult::from).collect())
}

// -- POST /search --

fn default_max_facts() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub group_ids: Vec<String>,
    pub query: String,
    #[serde(default = "default_max_facts")]
    pub max_facts: usize,
}

#[derive(Debug, Serialize)]
pub struct FactsResponse {
    pub facts: Vec<FactResult>,
}

pub async fn post_search(State(state): State<AppState>, Json(body): Json<SearchRequest>) -> Result<Json<FactsResponse>, ApiError> {
    let facts = search_facts(&state, &body.group_ids, &body.query, body.max_facts)?;
    Ok(Json(FactsResponse { facts }))
}

// -- POST /get-memory --

#[derive(Debug, Deserialize)]
pub struct GetMemoryRequest {
    pub group_id: String,
    #[serde(default = "default_max_facts")]
    pub max_facts: usize,
    pub center_node_uuid: Option<String>,
    pub messages: Vec<MessageIn>,
}

/// Hops a `find_related_entities` traversal can span when scoping
/// `/get-memory` to `center_node_uuid` (spec §4.8's graph retrieval, not an
/// unbounded walk of the whole graph).
const CENTER_NODE_MAX_HOPS: u32 = 2;

/// Confidence floor for `center_node_uuid` scoping. Low relative to
/// `find_related_entities`'s general use since this traversal exists to
/// widen `/get-memory`'s result set, not to assert fact reliability.
const CENTER_NODE_MIN_CONFIDENCE: f32 = 0.0;

/// Derives a query from the concatenation of the supplied messages (the
/// same pattern C11's summary generation uses to build language-adapter
/// input from a window of memories), optionally scoped to facts touching
/// `center_node_uuid` or an entity reachable from it (spec §4.8's
/// `findRelatedEntities`, rather than a substring match on the formatted
/// fact text).
pub async fn post_get_memory(State(state): State<AppState>, Json(body): Json<GetMemoryRequest>) -> Result<Json<FactsResponse>, ApiError> {
    let query: String = body.messages.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join(" ");
    let mut facts = search_facts_raw(&state, &[body.group_id.clone()], &query, body.max_facts.max(1) * 4)?;

    if let Some(center) = &body.center_node_uuid {
        let mut reachable: std::collections::HashSet<String> = state
            .engine
            .related_entities(center, CENTER_NODE_MAX_HOPS, CENTER_NODE_MIN_CONFIDENCE)
            .into_iter()
            .map(|(entity, _, _)| entity)
            .collect();
        reachable.insert(center.clone());
        facts.retain(|f| reachable.contains(&f.subject) || reachable.contains(&f.object));
    }
    facts.truncate(body.max_facts);
    Ok(Json(FactsResponse { facts: facts.iter().map(FactResult::from).collect() }))
}

// -- GET /episodes/:group_id --

#[derive(Debug, Deserialize)]
pub struct EpisodesQuery {
    pub last_n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EpisodeOut {
    pub uuid: String,
    pub name: String,
    pub content: String,
    pub valid_at: DateTime<Utc>,
    pub invalid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Episodic> for EpisodeOut {
    fn from(e: &Episodic) -> Self {
        EpisodeOut {
            uuid: e.uuid.to_string(),
            name: e.name.clone(),
            content: e.content.clone(),
            valid_at: e.valid_at,
            invalid_at: e.invalid_at,
            created_at: e.created_at,
        }
    }
}

pub async fn get_episodes(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(params): Query<EpisodesQuery>,
) -> Result<Json<Vec<EpisodeOut>>, ApiError> {
    let mut episodes = state.engine.episodes_by_group(&group_id)?;
    episodes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let last_n = params.last_n.unwrap_or(10);
    episodes.truncate(last_n);
    Ok(Json(episodes.iter().map(EpisodeOut::from).collect()))
}

// -- DELETE /group/:group_id, POST /clear --

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub async fn delete_group(State(state): State<AppState>, Path(group_id): Path<String>) -> Result<Json<SuccessResponse>, ApiError> {
    state.engine.delete_group(&group_id)?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn post_clear(State(state): State<AppState>) -> Result<Json<SuccessResponse>, ApiError> {
    state.engine.clear()?;
    Ok(Json(SuccessResponse { success: true }))
}
