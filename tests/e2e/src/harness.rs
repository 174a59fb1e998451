//! Deterministic [`Engine`] construction for end-to-end scenarios.
//!
//! Scenarios that need exact, repeatable entity/relation extraction script
//! it here rather than relying on [`graphzep_core::adapters::MockLanguageClient`]'s
//! capitalized-word heuristic, which only approximates real extraction.

use std::collections::HashMap;

use async_trait::async_trait;
use graphzep_core::adapters::language::{ExtractedFacts, LanguageClient};
use graphzep_core::adapters::MockEmbeddingClient;
use graphzep_core::{Engine, EngineOptions, Result};

/// A language adapter keyed by the exact episode content passed to
/// `complete_structured_once`; episodes with no matching script extract
/// zero entities and relations, mirroring a real adapter's behavior on
/// content it found nothing in.
pub struct ScriptedLanguageClient {
    scripts: HashMap<String, ExtractedFacts>,
}

impl ScriptedLanguageClient {
    pub fn new(scripts: impl IntoIterator<Item = (&'static str, ExtractedFacts)>) -> Self {
        Self { scripts: scripts.into_iter().map(|(k, v)| (k.to_string(), v)).collect() }
    }
}

#[async_trait]
impl LanguageClient for ScriptedLanguageClient {
    async fn complete_structured_once(&self, prompt: &str, _schema: &serde_json::Value) -> Result<serde_json::Value> {
        let facts = self.scripts.get(prompt).cloned().unwrap_or_default();
        Ok(serde_json::to_value(facts).expect("ExtractedFacts always serializes"))
    }
}

/// An in-memory engine wired to a [`ScriptedLanguageClient`] and the
/// deterministic [`MockEmbeddingClient`].
pub fn scripted_engine(scripts: impl IntoIterator<Item = (&'static str, ExtractedFacts)>) -> Engine {
    Engine::open(EngineOptions::default(), Box::new(MockEmbeddingClient::default()), Box::new(ScriptedLanguageClient::new(scripts)))
        .expect("an in-memory engine always opens")
}
