//! Core graph data model (C3): nodes, edges, facts, sessions, and the
//! ontology record types used to validate them.

pub mod edge;
pub mod fact;
pub mod node;
pub mod ontology_types;
pub mod session;

pub use edge::{Edge, EdgeCommon, HasMember, Mentions, RelatesTo};
pub use fact::{Fact, FactState};
pub use node::{Community, Entity, EpisodeType, Episodic, MemoryType, Node};
pub use ontology_types::{Diagnostic, OntologyClass, OntologyProperty, Restriction, Severity};
pub use session::{Session, SessionState, SessionSummary};
