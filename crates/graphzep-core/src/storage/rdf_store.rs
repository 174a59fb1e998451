//! In-memory RDF adapter (C4)
//!
//! An append-only multiset of triples with an LRU cache keyed by
//! canonicalized query text, grounded in the `RdfTriple`/`RdfValue` shape
//! from the retrieved `rdf_mcp_core` example and generalized to carry typed
//! literals (value, xsd datatype, optional language tag) rather than plain
//! strings, as spec §4.4 and §4.6 require for reified statements.

use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use super::serialize;
use super::{GraphStore, Row};
use crate::error::{Error, Result};
use crate::namespace::NamespaceRegistry;

/// An RDF object: either a URI reference or a typed literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RdfObject {
    Uri(String),
    Literal {
        value: String,
        datatype: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
    },
}

impl RdfObject {
    pub fn uri(s: impl Into<String>) -> Self {
        Self::Uri(s.into())
    }

    pub fn literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: datatype.into(),
            lang: None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RdfObject::Uri(u) => u,
            RdfObject::Literal { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: RdfObject,
}

impl Triple {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: RdfObject) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object,
        }
    }
}

const DEFAULT_CACHE_CAPACITY: usize = 256;
const DEFAULT_BATCH_SIZE: usize = 500;

struct Inner {
    triples: Vec<Triple>,
    cache: LruCache<String, Vec<Row>>,
}

/// Append-only in-memory triple store. Retraction removes matching triples
/// (used to keep the unreified `(subject, predicate, object)` triple in
/// sync when a fact is superseded) but the default path never mutates
/// existing triples in place.
pub struct RdfTripleStore {
    inner: Mutex<Inner>,
    namespaces: std::sync::Arc<NamespaceRegistry>,
    batch_size: usize,
}

impl RdfTripleStore {
    pub fn new(namespaces: std::sync::Arc<NamespaceRegistry>) -> Self {
        Self::with_cache_capacity(namespaces, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(namespaces: std::sync::Arc<NamespaceRegistry>, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                triples: Vec::new(),
                cache: LruCache::new(NonZeroUsize::new(capacity.max(1)).unwrap()),
            }),
            namespaces,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn insert(&self, triple: Triple) {
        let mut inner = self.inner.lock().expect("rdf store poisoned");
        inner.triples.push(triple);
        inner.cache.clear();
    }

    /// Inserts in chunks of `batch_size`, invalidating the query cache once
    /// per batch rather than once per triple.
    pub fn insert_batch(&self, triples: Vec<Triple>) {
        for chunk in triples.chunks(self.batch_size) {
            let mut inner = self.inner.lock().expect("rdf store poisoned");
            inner.triples.extend_from_slice(chunk);
            inner.cache.clear();
        }
    }

    pub fn retract(&self, subject: &str, predicate: &str, object: &RdfObject) {
        let mut inner = self.inner.lock().expect("rdf store poisoned");
        inner
            .triples
            .retain(|t| !(t.subject == subject && t.predicate == predicate && &t.object == object));
        inner.cache.clear();
    }

    pub fn triples_with_subject(&self, subject: &str) -> Vec<Triple> {
        let inner = self.inner.lock().expect("rdf store poisoned");
        inner.triples.iter().filter(|t| t.subject == subject).cloned().collect()
    }

    pub fn triples_with_predicate(&self, predicate: &str) -> Vec<Triple> {
        let inner = self.inner.lock().expect("rdf store poisoned");
        inner.triples.iter().filter(|t| t.predicate == predicate).cloned().collect()
    }

    pub fn all(&self) -> Vec<Triple> {
        let inner = self.inner.lock().expect("rdf store poisoned");
        inner.triples.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("rdf store poisoned").triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_turtle(&self) -> String {
        serialize::to_turtle(&self.all(), &self.namespaces)
    }

    pub fn to_rdf_xml(&self) -> String {
        serialize::to_rdf_xml(&self.all())
    }

    pub fn to_json_ld(&self) -> serde_json::Value {
        serialize::to_json_ld(&self.all(), &self.namespaces)
    }

    pub fn to_n_triples(&self) -> String {
        serialize::to_n_triples(&self.all())
    }

    /// Inverse of [`Self::to_turtle`] (spec testable property 4 / scenario F):
    /// parses the exact Turtle subset this store emits back into triples.
    pub fn from_turtle(&self, text: &str) -> Vec<Triple> {
        serialize::from_turtle(text, &self.namespaces)
    }

    /// Bounded-depth traversal over reified relation triples whose
    /// confidence is at least `min_confidence`, returning each reachable
    /// entity with the product of edge confidences along the shortest path
    /// and a human-readable path description (spec §4.8).
    pub fn find_related_entities(
        &self,
        start: &str,
        max_hops: u32,
        min_confidence: f32,
        confidence_of: impl Fn(&Triple) -> Option<f32>,
    ) -> Vec<(String, f32, String)> {
        let triples = self.all();
        let mut frontier: Vec<(String, f32, String)> = vec![(start.to_string(), 1.0, start.to_string())];
        let mut visited: HashMap<String, f32> = HashMap::new();
        let mut results = Vec::new();

        for _ in 0..max_hops {
            let mut next = Vec::new();
            for (node, confidence, path) in &frontier {
                for t in triples.iter().filter(|t| &t.subject == node) {
                    let edge_conf = match confidence_of(t) {
                        Some(c) if c >= min_confidence => c,
                        _ => continue,
                    };
                    let target = t.object.as_str().to_string();
                    let product = confidence * edge_conf;
                    let better = visited.get(&target).map(|best| product > *best).unwrap_or(true);
                    if better {
                        visited.insert(target.clone(), product);
                        let new_path = format!("{path} -[{}]-> {target}", t.predicate);
                        next.push((target.clone(), product, new_path.clone()));
                        results.push((target, product, new_path));
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        results
    }
}

impl GraphStore for RdfTripleStore {
    /// Interprets the bounded SPARQL `SELECT` dialect of spec §4.4 (see
    /// [`crate::storage::sparql`]) over the full triple set. Results are
    /// cached by canonicalized query text in the same `LruCache` the
    /// embedding adapter uses for query embeddings.
    fn execute_query(&self, pattern: &str, _params: &Row) -> Result<Vec<Row>> {
        let cache_key = canonicalize(pattern);
        if let Some(hit) = self.inner.lock().expect("rdf store poisoned").cache.get(&cache_key).cloned() {
            return Ok(hit);
        }

        let triples = self.all();
        let rows = super::sparql::execute_select(pattern, &triples)?;

        self.inner.lock().expect("rdf store poisoned").cache.put(cache_key, rows.clone());
        Ok(rows)
    }

    /// Triple insert/retract. `params["op"] = "insert" | "retract"`,
    /// `subject`/`predicate`/`object` as strings (object is treated as a
    /// URI; typed literals go through [`RdfTripleStore::insert`] directly).
    fn mutate(&self, _pattern: &str, params: &Row) -> Result<()> {
        let op = params.get("op").and_then(|v| v.as_str()).unwrap_or("insert");
        let subject = params
            .get("subject")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::query_shape("mutate requires $subject", (0, 0)))?;
        let predicate = params
            .get("predicate")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::query_shape("mutate requires $predicate", (0, 0)))?;
        let object = params
            .get("object")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::query_shape("mutate requires $object", (0, 0)))?;
        let obj = RdfObject::uri(object);
        match op {
            "insert" => self.insert(Triple::new(subject, predicate, obj)),
            "retract" => self.retract(subject, predicate, &obj),
            other => return Err(Error::query_shape(format!("unknown op {other}"), (0, 0))),
        }
        Ok(())
    }

    /// No secondary indexes to build; the store is a flat `Vec`. Present
    /// for trait-surface parity with the labelled-property adapter.
    fn create_indexes(&self) -> Result<()> {
        Ok(())
    }

    fn verify_connectivity(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn canonicalize(pattern: &str) -> String {
    pattern.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> std::sync::Arc<NamespaceRegistry> {
        std::sync::Arc::new(NamespaceRegistry::new())
    }

    #[test]
    fn insert_then_query_by_subject() {
        let store = RdfTripleStore::new(registry());
        store.insert(Triple::new("zepent:1", "zep:name", RdfObject::literal("Alice", "xsd:string")));
        let rows = store
            .execute_query("SELECT ?p ?o WHERE { zepent:1 ?p ?o }", &Row::new())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("o").unwrap(), "Alice");
        assert_eq!(rows[0].get("p").unwrap(), "zep:name");
    }

    #[test]
    fn repeated_query_hits_cache_until_a_write_invalidates_it() {
        let store = RdfTripleStore::new(registry());
        store.insert(Triple::new("a", "p", RdfObject::uri("b")));
        let first = store.execute_query("SELECT ?o WHERE { a p ?o }", &Row::new()).unwrap();
        let second = store.execute_query("SELECT ?o WHERE { a p ?o }", &Row::new()).unwrap();
        assert_eq!(first, second);
        store.insert(Triple::new("a", "p", RdfObject::uri("c")));
        let third = store.execute_query("SELECT ?o WHERE { a p ?o }", &Row::new()).unwrap();
        assert_eq!(third.len(), 2);
    }

    #[test]
    fn retract_removes_exact_match_only() {
        let store = RdfTripleStore::new(registry());
        store.insert(Triple::new("a", "p", RdfObject::uri("b")));
        store.insert(Triple::new("a", "p", RdfObject::uri("c")));
        store.retract("a", "p", &RdfObject::uri("b"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].object, RdfObject::uri("c"));
    }

    #[test]
    fn related_entities_traversal_respects_confidence_floor() {
        let store = RdfTripleStore::new(registry());
        store.insert(Triple::new("zepent:a", "zepmem:statement/s1", RdfObject::uri("zepent:b")));
        let results = store.find_related_entities("zepent:a", 2, 0.9, |_| Some(0.5));
        assert!(results.is_empty(), "edge below the confidence floor must not be traversed");
    }
}
