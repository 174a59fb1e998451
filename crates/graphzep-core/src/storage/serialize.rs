//! RDF serializers (C4): Turtle, RDF/XML, JSON-LD, N-Triples.
//!
//! Each takes a flat triple slice and the namespace registry so prefixes
//! are contracted consistently with the rest of the crate.

use super::rdf_store::{RdfObject, Triple};
use crate::namespace::NamespaceRegistry;
use serde_json::json;

fn contract(reg: &NamespaceRegistry, uri: &str) -> String {
    reg.contract(uri).unwrap_or_else(|| format!("<{uri}>"))
}

fn object_literal(reg: &NamespaceRegistry, obj: &RdfObject, quote: bool) -> String {
    match obj {
        RdfObject::Uri(u) => contract(reg, u),
        RdfObject::Literal { value, datatype, lang } => {
            let body = if quote { format!("\"{value}\"") } else { value.clone() };
            match lang {
                Some(l) => format!("{body}@{l}"),
                None => format!("{body}^^{}", contract(reg, datatype)),
            }
        }
    }
}

pub fn to_turtle(triples: &[Triple], reg: &NamespaceRegistry) -> String {
    let preamble = reg.turtle_preamble();
    let body: Vec<String> = triples
        .iter()
        .map(|t| {
            format!(
                "{} {} {} .",
                contract(reg, &t.subject),
                contract(reg, &t.predicate),
                object_literal(reg, &t.object, true)
            )
        })
        .collect();
    format!("{preamble}\n\n{}", body.join("\n"))
}

pub fn to_rdf_xml(triples: &[Triple]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\n");
    for t in triples {
        out.push_str(&format!("  <rdf:Description rdf:about=\"{}\">\n", t.subject));
        match &t.object {
            RdfObject::Uri(u) => {
                out.push_str(&format!("    <{} rdf:resource=\"{}\"/>\n", t.predicate, u));
            }
            RdfObject::Literal { value, datatype, .. } => {
                out.push_str(&format!(
                    "    <{} rdf:datatype=\"{}\">{}</{}>\n",
                    t.predicate, datatype, value, t.predicate
                ));
            }
        }
        out.push_str("  </rdf:Description>\n");
    }
    out.push_str("</rdf:RDF>\n");
    out
}

pub fn to_json_ld(triples: &[Triple], reg: &NamespaceRegistry) -> serde_json::Value {
    let graph: Vec<_> = triples
        .iter()
        .map(|t| {
            let object = match &t.object {
                RdfObject::Uri(u) => json!({ "@id": u }),
                RdfObject::Literal { value, datatype, lang } => {
                    if let Some(l) = lang {
                        json!({ "@value": value, "@language": l })
                    } else {
                        json!({ "@value": value, "@type": datatype })
                    }
                }
            };
            json!({ "@id": t.subject, t.predicate.clone(): object })
        })
        .collect();
    json!({ "@context": reg.jsonld_context(), "@graph": graph })
}

fn expand_term(reg: &NamespaceRegistry, term: &str) -> String {
    if let Some(uri) = term.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) {
        return uri.to_string();
    }
    reg.expand(term).unwrap_or_else(|| term.to_string())
}

fn parse_object(reg: &NamespaceRegistry, token: &str) -> RdfObject {
    let Some(rest) = token.strip_prefix('"') else {
        return RdfObject::Uri(expand_term(reg, token));
    };
    let end = rest.find('"').unwrap_or(rest.len());
    let value = rest[..end].to_string();
    let tail = &rest[end + 1..];
    if let Some(lang) = tail.strip_prefix('@') {
        RdfObject::Literal { value, datatype: reg.expand("xsd:string").unwrap_or_default(), lang: Some(lang.to_string()) }
    } else if let Some(datatype) = tail.strip_prefix("^^") {
        RdfObject::Literal { value, datatype: expand_term(reg, datatype), lang: None }
    } else {
        RdfObject::Literal { value, datatype: reg.expand("xsd:string").unwrap_or_default(), lang: None }
    }
}

/// Parses exactly the subset of Turtle [`to_turtle`] emits: an ignored
/// `@prefix` preamble (namespaces are resolved against `reg`, which already
/// knows every builtin) followed by one `subject predicate object .` triple
/// per line. Not a general-purpose Turtle parser.
pub fn from_turtle(text: &str, reg: &NamespaceRegistry) -> Vec<Triple> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("@prefix"))
        .filter_map(|line| {
            let line = line.strip_suffix(" .")?;
            let mut parts = line.splitn(3, char::is_whitespace);
            let subject = parts.next()?;
            let predicate = parts.next()?;
            let object = parts.next()?.trim();
            Some(Triple::new(expand_term(reg, subject), expand_term(reg, predicate), parse_object(reg, object)))
        })
        .collect()
}

pub fn to_n_triples(triples: &[Triple]) -> String {
    triples
        .iter()
        .map(|t| {
            let object = match &t.object {
                RdfObject::Uri(u) => format!("<{u}>"),
                RdfObject::Literal { value, datatype, lang } => match lang {
                    Some(l) => format!("\"{value}\"@{l}"),
                    None => format!("\"{value}\"^^<{datatype}>"),
                },
            };
            format!("<{}> <{}> {} .", t.subject, t.predicate, object)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Vec<Triple>, NamespaceRegistry) {
        let reg = NamespaceRegistry::new();
        let t = Triple::new(
            reg.expand("zepent:1").unwrap(),
            reg.expand("zep:name").unwrap(),
            RdfObject::literal("Alice", reg.expand("xsd:string").unwrap()),
        );
        (vec![t], reg)
    }

    #[test]
    fn turtle_includes_prefix_preamble_and_contracted_terms() {
        let (triples, reg) = sample();
        let ttl = to_turtle(&triples, &reg);
        assert!(ttl.contains("@prefix zepent:"));
        assert!(ttl.contains("zepent:1"));
        assert!(ttl.contains("\"Alice\""));
    }

    #[test]
    fn n_triples_uses_full_uris_and_no_preamble() {
        let (triples, _) = sample();
        let nt = to_n_triples(&triples);
        assert!(nt.starts_with('<'));
        assert!(!nt.contains("@prefix"));
    }

    #[test]
    fn json_ld_carries_a_context_object() {
        let (triples, reg) = sample();
        let doc = to_json_ld(&triples, &reg);
        assert!(doc.get("@context").is_some());
        assert!(doc.get("@graph").unwrap().as_array().unwrap().len() == 1);
    }

    #[test]
    fn turtle_round_trips_through_from_turtle() {
        let (triples, reg) = sample();
        let ttl = to_turtle(&triples, &reg);
        let reparsed = from_turtle(&ttl, &reg);
        assert_eq!(reparsed, triples);
    }

    #[test]
    fn turtle_round_trips_a_uri_valued_object() {
        let reg = NamespaceRegistry::new();
        let t = Triple::new(
            reg.expand("zepmem:ep1").unwrap(),
            reg.expand("zep:mentions").unwrap(),
            RdfObject::uri(reg.expand("zepent:1").unwrap()),
        );
        let ttl = to_turtle(&[t.clone()], &reg);
        assert_eq!(from_turtle(&ttl, &reg), vec![t]);
    }

    #[test]
    fn rdf_xml_wraps_descriptions_in_rdf_root() {
        let (triples, _) = sample();
        let xml = to_rdf_xml(&triples);
        assert!(xml.contains("<rdf:RDF"));
        assert!(xml.contains("rdf:Description"));
    }
}
