//! SPARQL-shaped query layer (C8)
//!
//! Named templates plus the four entry points retrieval and higher layers
//! call: `search_memories`, `get_memories_at_time`, `get_facts_about_entity`,
//! `find_related_entities`. Templates substitute keyword parameters
//! textually into a query string, sanitizing and substituting query text
//! the way a full-text search layer would, generalized from full-text
//! search to the RDF store's SPARQL subset.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::model::Fact;
use crate::storage::rdf_store::{RdfTripleStore, Triple};
use crate::storage::{GraphStore, Row};

/// Named query templates from spec §4.8. Each takes keyword parameters
/// substituted textually before execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    AllMemories,
    MemoriesBySession,
    HighConfidenceFacts,
    EntitiesByType,
    MemoryEvolutionByMonth,
}

impl Template {
    /// The raw SPARQL-shaped text before parameter substitution.
    pub fn text(&self) -> &'static str {
        match self {
            Template::AllMemories => "SELECT ?s WHERE { ?s rdf:type zep:EpisodicMemory }",
            Template::MemoriesBySession => {
                "SELECT ?s WHERE { ?s rdf:type zep:EpisodicMemory . ?s zep:sessionId \"{session_id}\" }"
            }
            Template::HighConfidenceFacts => {
                "SELECT ?s WHERE { ?s rdf:type rdf:Statement . ?s zep:confidence ?c . FILTER(?c >= {min_confidence}) }"
            }
            Template::EntitiesByType => "SELECT ?s WHERE { ?s rdf:type {entity_type} }",
            Template::MemoryEvolutionByMonth => {
                "SELECT ?month (COUNT(?s) AS ?count) WHERE { ?s rdf:type zep:EpisodicMemory . ?s zep:createdAt ?created . BIND(SUBSTR(?created, 1, 7) AS ?month) } GROUP BY ?month"
            }
        }
    }

    /// Substitutes `{key}` placeholders with `params[key]`, textually —
    /// matching spec §4.8's "substituted textually into the query before
    /// execution".
    pub fn render(&self, params: &HashMap<&str, String>) -> String {
        let mut text = self.text().to_string();
        for (key, value) in params {
            text = text.replace(&format!("{{{key}}}"), value);
        }
        text
    }

    /// Renders this template and executes it against `store`, the one path
    /// that actually runs the templates' SPARQL text rather than leaving it
    /// as a string nobody calls.
    pub fn run(&self, store: &RdfTripleStore, params: &HashMap<&str, String>) -> crate::error::Result<Vec<Row>> {
        let rendered = self.render(params);
        store.execute_query(&rendered, &Row::new())
    }
}

/// Runs [`Template::HighConfidenceFacts`], returning reified statement
/// subjects with `zep:confidence` at least `min_confidence`.
pub fn high_confidence_facts(store: &RdfTripleStore, min_confidence: f32) -> crate::error::Result<Vec<Row>> {
    let mut params = HashMap::new();
    params.insert("min_confidence", min_confidence.to_string());
    Template::HighConfidenceFacts.run(store, &params)
}

/// Runs [`Template::MemoryEvolutionByMonth`], returning one row per
/// `yyyy-mm` month with the count of episodes created that month.
pub fn memory_evolution_by_month(store: &RdfTripleStore) -> crate::error::Result<Vec<Row>> {
    Template::MemoryEvolutionByMonth.run(store, &HashMap::new())
}

/// Runs [`Template::EntitiesByType`], returning subjects of the given RDF
/// type (e.g. `zep:Entity`).
pub fn entities_by_type(store: &RdfTripleStore, entity_type: &str) -> crate::error::Result<Vec<Row>> {
    let mut params = HashMap::new();
    params.insert("entity_type", entity_type.to_string());
    Template::EntitiesByType.run(store, &params)
}

/// Filters episode-memory subjects whose content matches `query` (simple
/// substring match — semantic ranking belongs to [`crate::retrieval`],
/// which calls this layer only for candidate fetch, not final ranking).
pub fn search_memories(store: &RdfTripleStore, query: &str) -> Vec<String> {
    let query_lower = query.to_lowercase();
    store
        .all()
        .into_iter()
        .filter(|t| t.predicate == "zep:content" && t.object.as_str().to_lowercase().contains(&query_lower))
        .map(|t| t.subject)
        .collect()
}

/// Memories whose `[zep:validFrom, zep:validUntil)` interval contains `at`.
pub fn get_memories_at_time(store: &RdfTripleStore, at: DateTime<Utc>) -> Vec<String> {
    let triples = store.all();
    let mut subjects = Vec::new();
    for t in triples.iter().filter(|t| t.predicate == "rdf:type" && t.object.as_str() == "zep:EpisodicMemory") {
        let valid_from = triples
            .iter()
            .find(|x| x.subject == t.subject && x.predicate == "zep:validFrom")
            .and_then(|x| x.object.as_str().parse::<DateTime<Utc>>().ok());
        let valid_until = triples
            .iter()
            .find(|x| x.subject == t.subject && x.predicate == "zep:validUntil")
            .and_then(|x| x.object.as_str().parse::<DateTime<Utc>>().ok());
        let live = match valid_from {
            Some(from) => from <= at && valid_until.map(|u| at < u).unwrap_or(true),
            None => false,
        };
        if live {
            subjects.push(t.subject.clone());
        }
    }
    subjects
}

/// Facts whose reified statement names `entity_uri` as subject or object.
pub fn get_facts_about_entity<'a>(facts: &'a [Fact], entity_uri: &str) -> Vec<&'a Fact> {
    facts
        .iter()
        .filter(|f| f.subject == entity_uri || f.object == entity_uri)
        .collect()
}

/// Finds the reified statement node whose `rdf:subject`/`rdf:predicate`/
/// `rdf:object` equal the unreified triple `t`, then reads its
/// `zep:confidence` literal. Statement URIs are `zepmem/statement/{uuid}` —
/// a random uuid that never embeds the predicate name — so the only correct
/// correlation is matching all three reification triples, not the
/// statement's own URI text.
fn confidence_of_edge(triples: &[Triple], t: &Triple) -> Option<f32> {
    triples
        .iter()
        .filter(|x| x.predicate == "rdf:subject" && x.object.as_str() == t.subject)
        .find_map(|stmt_subject| {
            let stmt = stmt_subject.subject.as_str();
            let predicate_matches = triples.iter().any(|x| x.subject == stmt && x.predicate == "rdf:predicate" && x.object.as_str() == t.predicate);
            let object_matches = triples.iter().any(|x| x.subject == stmt && x.predicate == "rdf:object" && x.object.as_str() == t.object.as_str());
            if !(predicate_matches && object_matches) {
                return None;
            }
            triples.iter().find(|x| x.subject == stmt && x.predicate == "zep:confidence").and_then(|x| x.object.as_str().parse::<f32>().ok())
        })
}

/// Bounded-depth traversal delegating to [`RdfTripleStore::find_related_entities`],
/// supplying confidence lookup from the reified statement's `zep:confidence`
/// literal. An edge whose reified statement can't be found (or carries no
/// parseable confidence) is treated as absent, not as confidence 1.0.
pub fn find_related_entities(
    store: &RdfTripleStore,
    entity_uri: &str,
    max_hops: u32,
    min_confidence: f32,
) -> Vec<(String, f32, String)> {
    let triples = store.all();
    store.find_related_entities(entity_uri, max_hops, min_confidence, |t| confidence_of_edge(&triples, t))
}
