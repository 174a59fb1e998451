//! graphzep-core: a temporal knowledge-graph memory engine for
//! conversational agents.
//!
//! Entities, episodes, and facts live in a typed graph ([`model`]) behind
//! two storage adapters ([`storage`]) reachable through a shared
//! `GraphStore` trait: a SQLite-backed labelled-property graph, and an
//! in-memory RDF triple store with SPARQL-subset queries ([`query`]) and
//! Turtle/RDF-XML/JSON-LD/N-Triples serialization. An ontology manager
//! ([`ontology`]) validates triples against domain/range/cardinality
//! restrictions and bounds extraction-guidance prompts. The extraction
//! pipeline ([`extraction`]) turns an episode into entities and relations
//! via pluggable embedding/language adapters ([`adapters`]); the retrieval
//! engine ([`retrieval`]) ranks memories by semantic, keyword, hybrid
//! (RRF), or MMR search with optional graph-boost rerank. A session
//! manager ([`session`]) and memory manager ([`memory_manager`]) sit above
//! all of this, composed into a single [`engine::Engine`] value with no
//! module-level state.

pub mod adapters;
pub mod config;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod memory_manager;
pub mod model;
pub mod namespace;
pub mod ontology;
pub mod query;
pub mod rdf_mapper;
pub mod retrieval;
pub mod session;
pub mod storage;
pub mod time;

pub use engine::{Engine, EngineOptions, EngineSearchParams};
pub use error::{Error, ErrorKind, Result};

/// Common imports for callers wiring up an [`Engine`].
pub mod prelude {
    pub use crate::adapters::{EmbeddingClient, LanguageClient, MockEmbeddingClient, MockLanguageClient};
    pub use crate::engine::{Engine, EngineOptions, EngineSearchParams};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::memory_manager::{AddMemoryParams, PruneParams};
    pub use crate::model::{Edge, Entity, Episodic, Fact, MemoryType, Node, Session};
    pub use crate::retrieval::{SearchParams, SearchType};
    pub use crate::session::{CreateSessionParams, SummaryParams};
}
