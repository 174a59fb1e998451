//! Embedding & language model adapters (C5)
//!
//! Async traits so `complete_structured`/`embed` calls can be wrapped in a
//! `tokio::time::timeout`, the way `KnowledgeGraph` in the retrieved
//! `llmspell` example exposes an `async_trait` surface over a synchronous
//! storage core. The rest of this crate (storage, retrieval) stays
//! synchronous; only the LM/embedding boundary is async, because only it
//! crosses a real network or subprocess call.

pub mod embedding;
pub mod language;

#[cfg(feature = "embeddings")]
pub use embedding::LocalEmbeddingClient;
#[cfg(feature = "remote-llm")]
pub use embedding::OpenAiEmbeddingClient;
#[cfg(feature = "remote-llm")]
pub use language::OpenAiLanguageClient;

pub use embedding::{EmbeddingClient, MockEmbeddingClient};
pub use language::{ExtractedFacts, ExtractedRelation, LanguageClient, MockLanguageClient};
