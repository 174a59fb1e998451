//! Graph data model (C3) — ontology class/property records
//!
//! In-memory parsed form held by [`crate::ontology`]'s `OntologyManager`,
//! used only for triple validation and extraction-guidance generation
//! (spec §4.7). Not persisted as graph nodes.

use serde::{Deserialize, Serialize};

/// A cardinality, all-values-from, some-values-from, or has-value
/// restriction attached to a property on a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Restriction {
    MinCardinality { property: String, min: u32 },
    MaxCardinality { property: String, max: u32 },
    AllValuesFrom { property: String, class_uri: String },
    SomeValuesFrom { property: String, class_uri: String },
    HasValue { property: String, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OntologyClass {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub super_classes: Vec<String>,
    pub sub_classes: Vec<String>,
    pub restrictions: Vec<Restriction>,
}

impl OntologyClass {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OntologyProperty {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    pub restrictions: Vec<Restriction>,
}

impl OntologyProperty {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }
}

/// Severity for a single validation diagnostic, per testable property 9
// ("produces at least one error-level diagnostic").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_helpers_set_severity() {
        assert_eq!(Diagnostic::error("bad range").severity, Severity::Error);
        assert_eq!(Diagnostic::warning("unknown predicate").severity, Severity::Warning);
    }

    #[test]
    fn ontology_class_defaults_to_empty_hierarchy() {
        let c = OntologyClass::new("zep:Person");
        assert!(c.super_classes.is_empty());
        assert!(c.restrictions.is_empty());
    }
}
