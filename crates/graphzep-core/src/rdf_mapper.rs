//! RDF memory mapper (C6)
//!
//! Bidirectional translation between memory records (episodes, facts) and
//! reified RDF triples, per spec §4.6's URI conventions and embedding
//! encodings. Grounded in the same subject/predicate/object shape as the
//! retrieved `rdf_mcp_core` example, generalized to typed literals and
//! reification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Episodic, Fact};
use crate::storage::rdf_store::{RdfObject, Triple};

pub fn episodic_uri(uuid: Uuid) -> String {
    format!("zepmem/episodic/{uuid}")
}

pub fn semantic_uri(uuid: Uuid) -> String {
    format!("zepmem/semantic/{uuid}")
}

pub fn statement_uri(uuid: Uuid) -> String {
    format!("zepmem/statement/{uuid}")
}

pub fn entity_uri(uuid: Uuid) -> String {
    format!("zepent/{uuid}")
}

/// How an embedding vector is encoded as an RDF literal/reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingEncoding {
    /// `xsd:base64Binary` literal of the little-endian float32 bytes.
    Base64,
    /// `vector://{uuid}` URI; the vector itself stays in the adapter's
    /// side index for cosine math.
    VectorRef,
    /// Comma-separated fixed-precision text literal.
    Compressed,
}

fn xsd_datetime(t: DateTime<Utc>) -> String {
    t.to_rfc3339()
}

fn encode_embedding(encoding: EmbeddingEncoding, vector: &[f32], owner_uuid: Uuid) -> RdfObject {
    match encoding {
        EmbeddingEncoding::Base64 => {
            let mut bytes = Vec::with_capacity(vector.len() * 4);
            for v in vector {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
            RdfObject::literal(base64_encode(&bytes), "xsd:base64Binary")
        }
        EmbeddingEncoding::VectorRef => RdfObject::uri(format!("vector://{owner_uuid}")),
        EmbeddingEncoding::Compressed => {
            let text = vector.iter().map(|v| format!("{v:.6}")).collect::<Vec<_>>().join(",");
            RdfObject::literal(text, "xsd:string")
        }
    }
}

/// Minimal base64 encoder (standard alphabet, padded) so the mapper has no
/// external dependency for what is, per spec, just one of three pluggable
/// embedding encodings.
fn base64_encode(bytes: &[u8]) -> String {
    const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = *chunk.get(1).unwrap_or(&0) as u32;
        let b2 = *chunk.get(2).unwrap_or(&0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;
        out.push(ALPHABET[(triple >> 18 & 0x3F) as usize] as char);
        out.push(ALPHABET[(triple >> 12 & 0x3F) as usize] as char);
        out.push(if chunk.len() > 1 { ALPHABET[(triple >> 6 & 0x3F) as usize] as char } else { '=' });
        out.push(if chunk.len() > 2 { ALPHABET[(triple & 0x3F) as usize] as char } else { '=' });
    }
    out
}

/// Emits the full triple set for one episode: `rdf:type` plus the literal
/// properties spec §4.6 names. `access_count`/`relevance_score`/`summary`
/// are optional and omitted when absent.
pub fn episode_to_triples(
    ep: &Episodic,
    session_id: Option<&str>,
    access_count: Option<u64>,
    relevance_score: Option<f32>,
    summary: Option<&str>,
    encoding: EmbeddingEncoding,
) -> Vec<Triple> {
    let subject = episodic_uri(ep.uuid);
    let mut triples = vec![
        Triple::new(&subject, "rdf:type", RdfObject::uri("zep:EpisodicMemory")),
        Triple::new(&subject, "zep:uuid", RdfObject::literal(ep.uuid.to_string(), "xsd:string")),
        Triple::new(&subject, "zep:content", RdfObject::literal(&ep.content, "xsd:string")),
        Triple::new(&subject, "zep:createdAt", RdfObject::literal(xsd_datetime(ep.created_at), "xsd:dateTime")),
        Triple::new(&subject, "zep:validFrom", RdfObject::literal(xsd_datetime(ep.valid_at), "xsd:dateTime")),
    ];
    if let Some(session_id) = session_id {
        triples.push(Triple::new(&subject, "zep:sessionId", RdfObject::literal(session_id, "xsd:string")));
    }
    if let Some(invalid_at) = ep.invalid_at {
        triples.push(Triple::new(&subject, "zep:validUntil", RdfObject::literal(xsd_datetime(invalid_at), "xsd:dateTime")));
    }
    if let Some(count) = access_count {
        triples.push(Triple::new(&subject, "zep:accessCount", RdfObject::literal(count.to_string(), "xsd:integer")));
    }
    if let Some(score) = relevance_score {
        triples.push(Triple::new(&subject, "zep:relevanceScore", RdfObject::literal(format!("{score}"), "xsd:float")));
    }
    if let Some(summary) = summary {
        triples.push(Triple::new(&subject, "zep:summary", RdfObject::literal(summary, "xsd:string")));
    }
    if let Some(vector) = &ep.embedding {
        triples.push(Triple::new(&subject, "zep:embedding", encode_embedding(encoding, vector, ep.uuid)));
        triples.push(Triple::new(&subject, "zep:embeddingDimension", RdfObject::literal(vector.len().to_string(), "xsd:integer")));
    }
    triples
}

/// Emits both (a) the unreified `(subject, predicate, object)` triple for
/// direct graph queries, and (b) the reified statement carrying confidence,
/// validity, and one `zep:derivedFrom` per source episode.
pub fn fact_to_triples(fact: &Fact) -> Vec<Triple> {
    let mut triples = vec![Triple::new(&fact.subject, &fact.predicate, RdfObject::uri(&fact.object))];

    let statement = statement_uri(fact.uuid);
    triples.push(Triple::new(&statement, "rdf:type", RdfObject::uri("rdf:Statement")));
    triples.push(Triple::new(&statement, "rdf:subject", RdfObject::uri(&fact.subject)));
    triples.push(Triple::new(&statement, "rdf:predicate", RdfObject::uri(&fact.predicate)));
    triples.push(Triple::new(&statement, "rdf:object", RdfObject::uri(&fact.object)));
    triples.push(Triple::new(&statement, "zep:confidence", RdfObject::literal(format!("{}", fact.confidence), "xsd:float")));
    triples.push(Triple::new(&statement, "zep:validFrom", RdfObject::literal(xsd_datetime(fact.valid_from), "xsd:dateTime")));
    if let Some(until) = fact.valid_until {
        triples.push(Triple::new(&statement, "zep:validUntil", RdfObject::literal(xsd_datetime(until), "xsd:dateTime")));
    }
    for source in &fact.source_memory_ids {
        triples.push(Triple::new(&statement, "zep:derivedFrom", RdfObject::uri(episodic_uri(*source))));
    }
    triples
}

/// Reverse mapping: groups triples by subject, classifies by `rdf:type`,
/// and reconstructs a minimal episode record. Unknown literal datatypes
/// fall back to treating the value as a plain string (already the case
/// for every `RdfObject::Literal`, so this is a classification, not a
/// coercion, step).
pub fn triples_to_episode(subject: &str, triples: &[Triple]) -> Option<Episodic> {
    let relevant: Vec<&Triple> = triples.iter().filter(|t| t.subject == subject).collect();
    let is_episode = relevant
        .iter()
        .any(|t| t.predicate == "rdf:type" && t.object == RdfObject::uri("zep:EpisodicMemory"));
    if !is_episode {
        return None;
    }

    let get = |pred: &str| relevant.iter().find(|t| t.predicate == pred).map(|t| t.object.as_str().to_string());
    let uuid: Uuid = get("zep:uuid")?.parse().ok()?;
    let content = get("zep:content").unwrap_or_default();
    let valid_at: DateTime<Utc> = get("zep:validFrom")?.parse().ok()?;
    let created_at: DateTime<Utc> = get("zep:createdAt")?.parse().ok()?;

    Some(Episodic {
        uuid,
        name: subject.to_string(),
        group_id: String::new(),
        episode_type: crate::model::EpisodeType::Text,
        content,
        embedding: None,
        valid_at,
        invalid_at: get("zep:validUntil").and_then(|s| s.parse().ok()),
        reference_id: None,
        created_at,
        access_count: 0,
        last_accessed_at: None,
        memory_type: crate::model::MemoryType::Episodic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EpisodeType;

    #[test]
    fn episode_round_trips_through_triples() {
        let ep = Episodic::new("ep", "group-1", EpisodeType::Text, "hello world", Utc::now());
        let triples = episode_to_triples(&ep, Some("sess-1"), None, None, None, EmbeddingEncoding::Compressed);
        let subject = episodic_uri(ep.uuid);
        let roundtripped = triples_to_episode(&subject, &triples).unwrap();
        assert_eq!(roundtripped.uuid, ep.uuid);
        assert_eq!(roundtripped.content, ep.content);
    }

    #[test]
    fn fact_emits_unreified_triple_and_reified_statement() {
        let fact = Fact::new("g", "zepent:1", "zep:worksAt", "zepent:2", 0.9, Utc::now());
        let triples = fact_to_triples(&fact);
        assert!(triples.iter().any(|t| t.subject == fact.subject && t.predicate == fact.predicate));
        let statement = statement_uri(fact.uuid);
        assert!(triples.iter().any(|t| t.subject == statement && t.predicate == "rdf:type"));
        assert!(triples.iter().any(|t| t.subject == statement && t.predicate == "zep:confidence"));
    }

    #[test]
    fn derived_from_one_triple_per_source_episode() {
        let mut fact = Fact::new("g", "s", "p", "o", 0.5, Utc::now());
        fact.source_memory_ids.insert(crate::time::new_uuid());
        fact.source_memory_ids.insert(crate::time::new_uuid());
        let triples = fact_to_triples(&fact);
        let derived_count = triples.iter().filter(|t| t.predicate == "zep:derivedFrom").count();
        assert_eq!(derived_count, 2);
    }

    #[test]
    fn base64_embedding_encoding_round_trips_length() {
        let vector = vec![0.1f32, 0.2, 0.3];
        let obj = encode_embedding(EmbeddingEncoding::Base64, &vector, crate::time::new_uuid());
        match obj {
            RdfObject::Literal { datatype, .. } => assert_eq!(datatype, "xsd:base64Binary"),
            _ => panic!("expected a literal"),
        }
    }
}
