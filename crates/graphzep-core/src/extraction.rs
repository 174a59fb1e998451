//! Extraction pipeline (C9)
//!
//! Episode → entities + relations, per spec §4.9's five steps. Failures in
//! step 2 (language adapter) do not roll back the episode: it persists
//! with zero mentions, matching the `Extraction` recovery policy in §7
//! ("recovered locally, empty fact list").

use serde_json::json;

use crate::adapters::{language::complete_structured_with_retry, EmbeddingClient, LanguageClient};
use crate::error::Result;
use crate::model::{Entity, Episodic, Mentions, RelatesTo};
use crate::storage::property_graph::PropertyGraphStore;

/// Schema advertised to the language adapter for step 2.
fn extraction_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["entities", "relations"],
        "properties": {
            "entities": { "type": "array" },
            "relations": { "type": "array" }
        }
    })
}

#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    pub entity_uuids: Vec<uuid::Uuid>,
    pub mentions_created: usize,
    pub relations_created: usize,
    /// `(subject_name, predicate, object_name, valid_at)` for each newly
    /// created Relates-to edge, in creation order. The memory manager (C12)
    /// uses this to reify each relation as a [`crate::model::Fact`] without
    /// re-querying storage.
    pub relations: Vec<(String, String, String, chrono::DateTime<chrono::Utc>)>,
}

pub struct ExtractionPipeline<'a> {
    pub embedding: &'a dyn EmbeddingClient,
    pub language: &'a dyn LanguageClient,
    pub store: &'a PropertyGraphStore,
}

impl<'a> ExtractionPipeline<'a> {
    pub fn new(embedding: &'a dyn EmbeddingClient, language: &'a dyn LanguageClient, store: &'a PropertyGraphStore) -> Self {
        Self { embedding, language, store }
    }

    pub async fn extract(&self, episode: &Episodic) -> Result<ExtractionOutcome> {
        // Step 1: embed the episode text. A failure here is a genuine
        // adapter error (not covered by the Extraction-recovers-locally
        // policy, which is specific to the language adapter), so it
        // propagates.
        let embedding = self.embedding.embed(&episode.content).await?;
        let mut episode = episode.clone();
        episode.embedding = Some(embedding);
        self.store.insert_episodic(&episode)?;

        // Step 2: ask the language adapter for the structured extraction.
        // On failure (after the adapter's own one retry) the episode keeps
        // zero mentions rather than rolling back.
        let extracted = match complete_structured_with_retry(self.language, &episode.content, &extraction_schema()).await {
            Ok(value) => serde_json::from_value(value).unwrap_or_default(),
            Err(_) => crate::adapters::language::ExtractedFacts::default(),
        };

        let mut outcome = ExtractionOutcome::default();
        let mut resolved: Vec<(String, uuid::Uuid)> = Vec::new();

        // Step 3: resolve or create each entity.
        for extracted_entity in &extracted.entities {
            let existing = self.store.find_entity_by_name(&extracted_entity.name, &episode.group_id)?;
            let uuid = match existing {
                Some(entity) => entity.uuid,
                None => {
                    let mut entity = Entity::new(&extracted_entity.name, &episode.group_id, &extracted_entity.entity_type);
                    entity.summary = extracted_entity.summary.clone();
                    if !entity.summary.is_empty() {
                        entity.summary_embedding = Some(self.embedding.embed(&entity.summary).await?);
                    }
                    self.store.insert_entity(&entity)?;
                    entity.uuid
                }
            };
            resolved.push((extracted_entity.name.clone(), uuid));
            outcome.entity_uuids.push(uuid);
        }

        // Step 4: one Mentions edge per resolved entity.
        for (_, entity_uuid) in &resolved {
            let mentions = Mentions::new(&episode.group_id, episode.uuid, *entity_uuid);
            self.store.insert_mentions(&mentions)?;
            outcome.mentions_created += 1;
        }

        // Step 5: create Relates-to edges for relations whose endpoints
        // both resolved, deduped on (source, target, relation_name).
        for relation in &extracted.relations {
            let source = resolved.iter().find(|(name, _)| name == &relation.source_name).map(|(_, id)| *id);
            let target = resolved.iter().find(|(name, _)| name == &relation.target_name).map(|(_, id)| *id);
            let (Some(source), Some(target)) = (source, target) else {
                continue;
            };
            let source_str = source.to_string();
            let target_str = target.to_string();
            if self.store.find_relates_to(&episode.group_id, &source_str, &target_str, &relation.relation_name)? {
                continue;
            }
            let relates_to = RelatesTo::new(&episode.group_id, source, target, &relation.relation_name, episode.valid_at);
            self.store.insert_relates_to(&relates_to)?;
            outcome.relations_created += 1;
            outcome
                .relations
                .push((relation.source_name.clone(), relation.relation_name.clone(), relation.target_name.clone(), episode.valid_at));
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockEmbeddingClient, MockLanguageClient};
    use crate::model::EpisodeType;

    #[tokio::test]
    async fn extraction_creates_mentions_for_each_entity() {
        let embedding = MockEmbeddingClient::default();
        let language = MockLanguageClient::new();
        let store = PropertyGraphStore::open(None).unwrap();
        let pipeline = ExtractionPipeline::new(&embedding, &language, &store);

        let episode = Episodic::new("ep-1", "group-1", EpisodeType::Text, "Alice met Bob", chrono::Utc::now());
        let outcome = pipeline.extract(&episode).await.unwrap();
        assert_eq!(outcome.mentions_created, outcome.entity_uuids.len());
        assert!(outcome.entity_uuids.len() >= 2);
    }

    #[tokio::test]
    async fn repeated_entity_name_within_group_is_deduped() {
        let embedding = MockEmbeddingClient::default();
        let language = MockLanguageClient::new();
        let store = PropertyGraphStore::open(None).unwrap();
        let pipeline = ExtractionPipeline::new(&embedding, &language, &store);

        let ep1 = Episodic::new("ep-1", "group-1", EpisodeType::Text, "Alice called", chrono::Utc::now());
        let ep2 = Episodic::new("ep-2", "group-1", EpisodeType::Text, "Alice replied", chrono::Utc::now());
        let out1 = pipeline.extract(&ep1).await.unwrap();
        let out2 = pipeline.extract(&ep2).await.unwrap();
        assert_eq!(out1.entity_uuids, out2.entity_uuids, "same name+group must resolve to the same entity");
    }

    #[tokio::test]
    async fn language_adapter_failure_leaves_episode_with_zero_mentions() {
        struct AlwaysFails;
        #[async_trait::async_trait]
        impl crate::adapters::LanguageClient for AlwaysFails {
            async fn complete_structured_once(&self, _prompt: &str, _schema: &serde_json::Value) -> Result<serde_json::Value> {
                Ok(serde_json::json!({}))
            }
        }
        let embedding = MockEmbeddingClient::default();
        let language = AlwaysFails;
        let store = PropertyGraphStore::open(None).unwrap();
        let pipeline = ExtractionPipeline::new(&embedding, &language, &store);

        let episode = Episodic::new("ep-1", "group-1", EpisodeType::Text, "Alice met Bob", chrono::Utc::now());
        let outcome = pipeline.extract(&episode).await.unwrap();
        assert_eq!(outcome.mentions_created, 0);
        assert!(store.get_entity(&episode.uuid.to_string()).unwrap().is_none());
    }
}
