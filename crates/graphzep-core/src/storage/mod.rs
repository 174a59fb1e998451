//! Storage adapters (C4)
//!
//! Two adapters implement [`GraphStore`]: [`property_graph::PropertyGraphStore`]
//! (rusqlite-backed, a bounded Cypher-like pattern subset, reader/writer
//! `Mutex<Connection>`, idempotent migrations) and [`rdf_store::RdfTripleStore`]
//! (an in-memory append-only triple multiset with an LRU result cache). A
//! shared trait lets the engine be backed by either.

mod migrations;
pub mod property_graph;
pub mod rdf_store;
pub mod serialize;
pub mod sparql;

pub use migrations::MIGRATIONS;
pub use property_graph::PropertyGraphStore;
pub use rdf_store::RdfTripleStore;

use crate::error::Result;
use serde_json::Value;

/// A single result row from `execute_query`. Column names come from the
/// pattern's `RETURN`/`SELECT` clause.
pub type Row = std::collections::HashMap<String, Value>;

/// Minimal surface shared by the labelled-property and RDF adapters (spec
/// §4.4). Implementors must make mutation atomic: a constraint violation
/// must not partially apply.
pub trait GraphStore: Send + Sync {
    /// Executes a read-only pattern (bounded Cypher subset, or SPARQL
    /// subset for the RDF adapter) and returns matching rows.
    fn execute_query(&self, pattern: &str, params: &Row) -> Result<Vec<Row>>;

    /// Executes a single mutating pattern (`SET`, `DETACH DELETE`, `MERGE`,
    /// or an RDF triple insert/retract). Atomic: either fully applies or
    /// leaves the store unchanged.
    fn mutate(&self, pattern: &str, params: &Row) -> Result<()>;

    /// Idempotently creates the indexes required by the persisted layout
    /// (unique uuid indexes, secondary `group_id` indexes).
    fn create_indexes(&self) -> Result<()>;

    /// Cheap round-trip to confirm the backend is reachable.
    fn verify_connectivity(&self) -> Result<()>;

    /// Releases held resources. Idempotent.
    fn close(&self) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Row;
    use serde_json::Value;

    pub fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }
}
