//! Namespace registry (C2)
//!
//! Bijection between short prefixes and full URIs. Feeds the `@prefix`
//! preamble the RDF serializers in [`crate::storage::rdf_store`] emit, and
//! expands/contracts CURIEs for the RDF memory mapper and ontology manager.
//!
//! Per spec §5, mutation (`add_namespace`) is the one write path and must be
//! serialized by a writer lock; reads never block on each other.

use std::collections::HashMap;
use std::sync::RwLock;

/// Namespaces wired in at process start, matching spec §6's RDF namespace
/// table exactly.
const BUILTIN: &[(&str, &str)] = &[
    ("zep", "http://graphzep.ai/ontology#"),
    ("zepmem", "http://graphzep.ai/memory#"),
    ("zeptime", "http://graphzep.ai/temporal#"),
    ("zepent", "http://graphzep.ai/entity#"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("time", "http://www.w3.org/2006/time#"),
    ("prov", "http://www.w3.org/ns/prov#"),
    ("schema", "http://schema.org/"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("dcterms", "http://purl.org/dc/terms/"),
];

struct Inner {
    prefix_to_uri: HashMap<String, String>,
    uri_to_prefix: HashMap<String, String>,
}

/// Process-wide prefix ↔ URI registry.
pub struct NamespaceRegistry {
    inner: RwLock<Inner>,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        let mut prefix_to_uri = HashMap::new();
        let mut uri_to_prefix = HashMap::new();
        for (prefix, uri) in BUILTIN {
            prefix_to_uri.insert(prefix.to_string(), uri.to_string());
            uri_to_prefix.insert(uri.to_string(), prefix.to_string());
        }
        Self {
            inner: RwLock::new(Inner {
                prefix_to_uri,
                uri_to_prefix,
            }),
        }
    }
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) a prefix → URI mapping. Serialized by the
    /// writer lock so concurrent `load_ontology`/`add_namespace` calls
    /// cannot interleave.
    pub fn add_namespace(&self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        let uri = uri.into();
        let mut inner = self.inner.write().expect("namespace registry poisoned");
        inner.uri_to_prefix.insert(uri.clone(), prefix.clone());
        inner.prefix_to_uri.insert(prefix, uri);
    }

    /// Expand `prefix:local` into a full URI. Returns `None` if the prefix
    /// is unregistered.
    pub fn expand(&self, curie: &str) -> Option<String> {
        let (prefix, local) = curie.split_once(':')?;
        let inner = self.inner.read().expect("namespace registry poisoned");
        inner
            .prefix_to_uri
            .get(prefix)
            .map(|base| format!("{base}{local}"))
    }

    /// Contract a full URI back to `prefix:local` using the longest
    /// registered base that is a prefix of `uri`.
    pub fn contract(&self, uri: &str) -> Option<String> {
        let inner = self.inner.read().expect("namespace registry poisoned");
        inner
            .uri_to_prefix
            .iter()
            .filter(|(base, _)| uri.starts_with(base.as_str()))
            .max_by_key(|(base, _)| base.len())
            .map(|(base, prefix)| format!("{prefix}:{}", &uri[base.len()..]))
    }

    /// Turtle `@prefix` preamble for every registered namespace, used by the
    /// RDF store's Turtle serializer.
    pub fn turtle_preamble(&self) -> String {
        let inner = self.inner.read().expect("namespace registry poisoned");
        let mut prefixes: Vec<_> = inner.prefix_to_uri.iter().collect();
        prefixes.sort_by_key(|(prefix, _)| prefix.to_string());
        prefixes
            .into_iter()
            .map(|(prefix, uri)| format!("@prefix {prefix}: <{uri}> ."))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `@context` object for JSON-LD export.
    pub fn jsonld_context(&self) -> serde_json::Value {
        let inner = self.inner.read().expect("namespace registry poisoned");
        serde_json::Value::Object(
            inner
                .prefix_to_uri
                .iter()
                .map(|(p, u)| (p.clone(), serde_json::Value::String(u.clone())))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_namespaces_expand() {
        let reg = NamespaceRegistry::new();
        assert_eq!(
            reg.expand("zep:Entity"),
            Some("http://graphzep.ai/ontology#Entity".to_string())
        );
    }

    #[test]
    fn round_trip_expand_contract() {
        let reg = NamespaceRegistry::new();
        let uri = reg.expand("zepent:1234").unwrap();
        assert_eq!(reg.contract(&uri), Some("zepent:1234".to_string()));
    }

    #[test]
    fn unknown_prefix_expands_to_none() {
        let reg = NamespaceRegistry::new();
        assert_eq!(reg.expand("nope:x"), None);
    }

    #[test]
    fn added_namespace_is_usable_immediately() {
        let reg = NamespaceRegistry::new();
        reg.add_namespace("ex", "http://example.com/");
        assert_eq!(reg.expand("ex:Thing"), Some("http://example.com/Thing".to_string()));
    }

    #[test]
    fn turtle_preamble_contains_all_builtins() {
        let reg = NamespaceRegistry::new();
        let preamble = reg.turtle_preamble();
        for (prefix, _) in BUILTIN {
            assert!(preamble.contains(&format!("@prefix {prefix}:")));
        }
    }
}
