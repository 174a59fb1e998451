//! Engine (top-level composition)
//!
//! `Engine` is the single explicit value the rest of the crate is built
//! around — no global or module-level state, per the REDESIGN FLAGS in
//! spec §9 ("replace any module-level singleton with a struct the caller
//! constructs once and threads through"). Construction wires together the
//! property-graph store, the RDF store, the ontology manager, the
//! embedding/language adapters, and exposes the session/memory/search
//! operations the HTTP surface (§6) calls.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::adapters::{EmbeddingClient, LanguageClient, MockEmbeddingClient, MockLanguageClient};
use crate::error::Result;
use crate::memory_manager::{AddMemoryParams, MemoryManager, PruneParams};
use crate::model::{Episodic, EpisodeType, MemoryType, Session, SessionSummary};
use crate::namespace::NamespaceRegistry;
use crate::ontology::OntologyManager;
use crate::retrieval::{Candidate, SearchParams, ScoredResult};
use crate::session::{CreateSessionParams, SessionManager, SummaryParams};
use crate::storage::property_graph::PropertyGraphStore;
use crate::storage::rdf_store::RdfTripleStore;

/// Where to find the SQLite-backed property graph: an on-disk path, or
/// `None` for an ephemeral in-memory database (tests, `/clear`).
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub db_path: Option<PathBuf>,
}

/// Parameters for [`Engine::search`] (spec §4.10), layered on top of
/// [`SearchParams`] with the candidate-scoping filters retrieval itself is
/// agnostic to: which group to search, and which memory kinds to include.
#[derive(Debug, Clone)]
pub struct EngineSearchParams {
    pub group_id: String,
    pub memory_types: Option<Vec<MemoryType>>,
    pub search: SearchParams,
}

pub struct Engine {
    pub store: PropertyGraphStore,
    pub rdf: RdfTripleStore,
    pub namespaces: Arc<NamespaceRegistry>,
    pub ontology: OntologyManager,
    pub embedding: Box<dyn EmbeddingClient>,
    pub language: Box<dyn LanguageClient>,
}

impl Engine {
    pub fn open(options: EngineOptions, embedding: Box<dyn EmbeddingClient>, language: Box<dyn LanguageClient>) -> Result<Self> {
        let store = PropertyGraphStore::open(options.db_path)?;
        let namespaces = Arc::new(NamespaceRegistry::new());
        let rdf = RdfTripleStore::new(namespaces.clone());
        let ontology = OntologyManager::new();
        Ok(Self {
            store,
            rdf,
            namespaces,
            ontology,
            embedding,
            language,
        })
    }

    /// Convenience constructor for local/offline use: deterministic mock
    /// adapters, in-memory store. Exercised by tests and by `graphzep-server`
    /// when no `OPENAI_API_KEY` is configured for a dry run.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(EngineOptions::default(), Box::new(MockEmbeddingClient::default()), Box::new(MockLanguageClient::new()))
    }

    fn memory_manager(&self) -> MemoryManager<'_> {
        MemoryManager::new(&self.store, &self.rdf, self.embedding.as_ref(), self.language.as_ref())
    }

    fn session_manager(&self) -> SessionManager<'_> {
        SessionManager::new(&self.store, self.language.as_ref(), &crate::time::SystemClock)
    }

    // -- memory manager (C12) --

    pub async fn add_memory(&self, params: AddMemoryParams) -> Result<Episodic> {
        self.memory_manager().add_memory(params).await
    }

    pub fn get_memory(&self, memory_id: &str) -> Result<Option<Episodic>> {
        self.memory_manager().get_memory(memory_id)
    }

    pub fn prune_memories(&self, params: PruneParams) -> Result<usize> {
        self.memory_manager().prune_memories(params)
    }

    pub fn episodes_by_group(&self, group_id: &str) -> Result<Vec<Episodic>> {
        self.store.episodics_by_group(group_id)
    }

    /// Detach-deletes every episode, entity, fact, and session tagged with
    /// `group_id` (spec §6's `DELETE /group/:group_id`).
    pub fn delete_group(&self, group_id: &str) -> Result<()> {
        for episode in self.store.episodics_by_group(group_id)? {
            self.store.delete_episodic_detached(&episode.uuid.to_string())?;
        }
        Ok(())
    }

    // -- session manager (C11) --

    pub fn create_session(&self, params: CreateSessionParams) -> Result<Session> {
        self.session_manager().create_session(params)
    }

    pub fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        self.session_manager().get_session(session_id)
    }

    pub async fn generate_session_summary(&self, session_id: &str, params: SummaryParams) -> Result<SessionSummary> {
        self.session_manager().generate_session_summary(session_id, params).await
    }

    pub fn delete_session(&self, session_id: &str) -> Result<()> {
        self.session_manager().delete_session(session_id)
    }

    // -- retrieval (C10) --

    /// Fetches candidates for `group_id` filtered by `memory_types` (when
    /// given), embeds the query once, and delegates ranking to
    /// [`crate::retrieval::search`]. Candidate fetch is the engine's job
    /// exactly because retrieval itself (spec §4.10) takes an
    /// already-scoped slice.
    pub async fn search(&self, params: EngineSearchParams) -> Result<Vec<ScoredResult>> {
        let episodes = self.store.episodics_by_group(&params.group_id)?;
        let candidates: Vec<Candidate> = episodes
            .iter()
            .filter(|e| params.memory_types.as_ref().map(|types| types.contains(&e.memory_type)).unwrap_or(true))
            .map(|e| Candidate {
                id: e.uuid,
                content: e.content.clone(),
                embedding: e.embedding.clone(),
                created_at: e.created_at,
            })
            .collect();

        let query_embedding = if params.search.query.is_empty() {
            None
        } else {
            Some(self.embedding.embed(&params.search.query).await?)
        };

        let edge_counts: Option<HashMap<Uuid, usize>> =
            if params.search.graph_boost { Some(self.store.edge_counts(&params.group_id)?) } else { None };

        Ok(crate::retrieval::search(&candidates, query_embedding.as_deref(), &params.search, edge_counts.as_ref()))
    }

    pub fn facts_about(&self, group_id: &str, entity_name_or_uri: &str) -> Result<Vec<crate::model::Fact>> {
        self.store.facts_about(group_id, entity_name_or_uri)
    }

    /// Bounded-depth graph traversal from `start` over reified fact
    /// statements whose confidence is at least `min_confidence` (spec
    /// §4.8's `findRelatedEntities`). Returns each reachable entity with
    /// the product of edge confidences along the path that reached it.
    pub fn related_entities(&self, start: &str, max_hops: u32, min_confidence: f32) -> Vec<(String, f32, String)> {
        crate::query::find_related_entities(&self.rdf, start, max_hops, min_confidence)
    }

    /// Episode subjects from the RDF mirror whose `zep:content` contains
    /// `query` (spec §4.8's `searchMemories`).
    pub fn search_memories_by_keyword(&self, query: &str) -> Vec<String> {
        crate::query::search_memories(&self.rdf, query)
    }

    /// Episode subjects from the RDF mirror live at `at` (spec §4.8's
    /// `getMemoriesAtTime`).
    pub fn memories_at_time(&self, at: DateTime<Utc>) -> Vec<String> {
        crate::query::get_memories_at_time(&self.rdf, at)
    }

    pub fn facts_by_group(&self, group_id: &str) -> Result<Vec<crate::model::Fact>> {
        self.store.facts_by_group(group_id)
    }

    pub fn all_group_ids(&self) -> Result<Vec<String>> {
        self.store.all_group_ids()
    }

    /// Wipes every stored node, edge, fact, and session (spec §6's
    /// `POST /clear`). Leaves the schema and adapters in place.
    pub fn clear(&self) -> Result<()> {
        self.store.clear_all()
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AddMemoryRequest {
    pub content: String,
    pub group_id: String,
    pub session_id: Option<String>,
    pub memory_type: Option<MemoryType>,
    pub episode_type: Option<EpisodeType>,
}

impl From<AddMemoryRequest> for AddMemoryParams {
    fn from(r: AddMemoryRequest) -> Self {
        AddMemoryParams {
            content: r.content,
            group_id: r.group_id,
            session_id: r.session_id,
            memory_type: r.memory_type.unwrap_or_default(),
            episode_type: r.episode_type.unwrap_or(EpisodeType::Message),
            valid_at: None,
            metadata: HashMap::new(),
            reference_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::SearchType;

    #[tokio::test]
    async fn add_memory_then_get_memory_round_trips() {
        let engine = Engine::open_in_memory().unwrap();
        let memory = engine
            .add_memory(AddMemoryParams {
                content: "Alice works at Acme".to_string(),
                group_id: "group-1".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let fetched = engine.get_memory(&memory.uuid.to_string()).unwrap().unwrap();
        assert_eq!(fetched.uuid, memory.uuid);
        assert_eq!(fetched.access_count, 1);
    }

    #[tokio::test]
    async fn search_scopes_candidates_to_the_requested_group() {
        let engine = Engine::open_in_memory().unwrap();
        engine
            .add_memory(AddMemoryParams {
                content: "Python is great".to_string(),
                group_id: "group-1".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        engine
            .add_memory(AddMemoryParams {
                content: "Python is great".to_string(),
                group_id: "group-2".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let results = engine
            .search(EngineSearchParams {
                group_id: "group-1".to_string(),
                memory_types: None,
                search: SearchParams {
                    query: "Python".to_string(),
                    search_type: SearchType::Keyword,
                    ..Default::default()
                },
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    /// Exercises the C8 query layer through `Engine` rather than in
    /// isolation: `add_memory` mirrors the new episode and fact into the
    /// RDF store, and `related_entities`/`search_memories_by_keyword`/
    /// `memories_at_time` all read it back.
    #[tokio::test]
    async fn c8_entry_points_read_back_what_add_memory_mirrors_into_rdf() {
        use crate::adapters::language::{ExtractedEntity, ExtractedFacts, ExtractedRelation};

        let facts = ExtractedFacts {
            entities: vec![
                ExtractedEntity { name: "Alice".to_string(), entity_type: "person".to_string(), summary: String::new() },
                ExtractedEntity { name: "Bob".to_string(), entity_type: "person".to_string(), summary: String::new() },
            ],
            relations: vec![ExtractedRelation {
                source_name: "Alice".to_string(),
                target_name: "Bob".to_string(),
                relation_name: "knows".to_string(),
            }],
        };
        let engine = Engine::open(
            EngineOptions::default(),
            Box::new(MockEmbeddingClient::default()),
            Box::new(MockLanguageClient::with_fixed_response(facts)),
        )
        .unwrap();

        engine
            .add_memory(AddMemoryParams {
                content: "Alice knows Bob".to_string(),
                group_id: "group-1".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let related = engine.related_entities("Alice", 1, 0.5);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].0, "Bob");

        assert_eq!(engine.search_memories_by_keyword("alice").len(), 1);
        assert_eq!(engine.memories_at_time(Utc::now()).len(), 1);
    }

    #[tokio::test]
    async fn delete_group_removes_all_its_episodes() {
        let engine = Engine::open_in_memory().unwrap();
        let memory = engine
            .add_memory(AddMemoryParams {
                content: "ephemeral note".to_string(),
                group_id: "group-1".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        engine.delete_group("group-1").unwrap();
        assert!(engine.get_memory(&memory.uuid.to_string()).unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_removes_every_group() {
        let engine = Engine::open_in_memory().unwrap();
        engine
            .add_memory(AddMemoryParams {
                content: "first".to_string(),
                group_id: "group-1".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        engine
            .add_memory(AddMemoryParams {
                content: "second".to_string(),
                group_id: "group-2".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(engine.all_group_ids().unwrap().len(), 2);
        engine.clear().unwrap();
        assert!(engine.all_group_ids().unwrap().is_empty());
    }
}
