//! Memory manager (C12)
//!
//! `add_memory`, `get_memory`, and `prune_memories`, per spec §4.12. Sits
//! above [`ExtractionPipeline`] and [`PropertyGraphStore`] the same way
//! `SessionManager` sits above `PropertyGraphStore` and the language
//! adapter: a thin orchestration layer that owns no state of its own.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::adapters::{EmbeddingClient, LanguageClient};
use crate::error::{Error, Result};
use crate::extraction::ExtractionPipeline;
use crate::model::{Episodic, EpisodeType, Fact, MemoryType};
use crate::storage::property_graph::PropertyGraphStore;
use crate::storage::rdf_store::RdfTripleStore;

/// The outer deadline `add_memory` enforces around embed+extract+persist
/// (spec §4.12). Generous relative to the language adapter's own 30s
/// per-attempt timeout (spec §4.5) since extraction may retry once.
pub const ADD_MEMORY_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters for `add_memory` (spec §4.12).
#[derive(Debug, Clone)]
pub struct AddMemoryParams {
    pub content: String,
    pub group_id: String,
    pub session_id: Option<String>,
    pub memory_type: MemoryType,
    pub episode_type: EpisodeType,
    pub valid_at: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, String>,
    /// External correlation id (spec §3's `reference_id`), e.g. a
    /// caller-supplied message uuid from the ingestion HTTP surface.
    pub reference_id: Option<String>,
}

impl Default for AddMemoryParams {
    fn default() -> Self {
        Self {
            content: String::new(),
            group_id: String::new(),
            session_id: None,
            memory_type: MemoryType::Episodic,
            episode_type: EpisodeType::Message,
            valid_at: None,
            metadata: HashMap::new(),
            reference_id: None,
        }
    }
}

/// Parameters for `prune_memories` (spec §4.12).
#[derive(Debug, Clone, Default)]
pub struct PruneParams {
    pub group_id: Option<String>,
    pub older_than: Option<DateTime<Utc>>,
    pub keep_recent: usize,
}

pub struct MemoryManager<'a> {
    pub store: &'a PropertyGraphStore,
    pub rdf: &'a RdfTripleStore,
    pub embedding: &'a dyn EmbeddingClient,
    pub language: &'a dyn LanguageClient,
}

impl<'a> MemoryManager<'a> {
    pub fn new(store: &'a PropertyGraphStore, rdf: &'a RdfTripleStore, embedding: &'a dyn EmbeddingClient, language: &'a dyn LanguageClient) -> Self {
        Self { store, rdf, embedding, language }
    }

    /// Embeds, extracts (C9), and persists a new episode, reifying each
    /// extracted relation as a [`Fact`] with the episode as its sole
    /// provenance source. A same-triple fact already live at `valid_at` is
    /// superseded rather than duplicated (spec §3, §9).
    ///
    /// The whole operation is bounded by [`ADD_MEMORY_TIMEOUT`]; a timeout
    /// surfaces as `Error::extraction` rather than leaving a half-written
    /// episode silently pending.
    pub async fn add_memory(&self, params: AddMemoryParams) -> Result<Episodic> {
        if params.content.trim().is_empty() {
            return Err(Error::validation("memory content must not be empty"));
        }
        let valid_at = params.valid_at.unwrap_or_else(Utc::now);
        let name: String = params.content.chars().take(40).collect();
        let mut episode = Episodic::new(name, params.group_id.clone(), params.episode_type, params.content.clone(), valid_at);
        episode.memory_type = params.memory_type;
        episode.reference_id = params.reference_id.clone();

        tokio::time::timeout(ADD_MEMORY_TIMEOUT, self.add_memory_inner(&mut episode))
            .await
            .map_err(|_| Error::extraction("add_memory exceeded its 30s budget"))??;

        if let Some(session_id) = &params.session_id {
            if let Some(mut session) = self.store.get_session(session_id)? {
                session.add_memory(episode.uuid, episode.created_at);
                self.store.insert_session(&session)?;
            }
        }

        Ok(episode)
    }

    async fn add_memory_inner(&self, episode: &mut Episodic) -> Result<()> {
        let pipeline = ExtractionPipeline::new(self.embedding, self.language, self.store);
        let outcome = pipeline.extract(episode).await?;

        // extract() persists the episode with its embedding and creates
        // entities/Mentions/RelatesTo edges; re-fetch so `episode` reflects
        // what's stored (notably the embedding).
        if let Some(stored) = self.store.get_episodic(&episode.uuid.to_string())? {
            *episode = stored;
        }

        self.rdf.insert_batch(crate::rdf_mapper::episode_to_triples(
            episode,
            None,
            Some(episode.access_count),
            None,
            None,
            crate::rdf_mapper::EmbeddingEncoding::Base64,
        ));

        // Reify each resolved relation as a Fact, superseding any live fact
        // sharing the same (subject, predicate, object) triple key.
        for (subject, predicate, object, valid_at) in &outcome.relations {
            self.store.supersede_live_facts(&episode.group_id, subject, predicate, object, *valid_at)?;
            self.store.invalidate_prior_values(&episode.group_id, subject, predicate, object, *valid_at)?;
            let mut fact = Fact::new(&episode.group_id, subject, predicate, object, 1.0, *valid_at);
            fact.source_memory_ids.insert(episode.uuid);
            self.store.insert_fact(&fact)?;
            self.rdf.insert_batch(crate::rdf_mapper::fact_to_triples(&fact));
        }

        Ok(())
    }

    /// Atomically bumps `access_count` and returns the memory, or `None`
    /// if it doesn't exist (spec testable property 8).
    pub fn get_memory(&self, memory_id: &str) -> Result<Option<Episodic>> {
        self.store.touch_episodic(memory_id)
    }

    /// Deletes all but the `keep_recent` newest episodes (by `created_at`)
    /// in scope, further restricted to those older than `older_than` when
    /// given, cascading to their Mentions edges (spec §4.12 prune policy).
    pub fn prune_memories(&self, params: PruneParams) -> Result<usize> {
        let candidates = self
            .store
            .prunable_episodics(params.group_id.as_deref(), params.older_than, params.keep_recent)?;
        for uuid in &candidates {
            self.store.delete_episodic_detached(uuid)?;
        }
        Ok(candidates.len())
    }
}
