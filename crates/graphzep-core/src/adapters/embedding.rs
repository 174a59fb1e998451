//! Embedding adapter (C5)
//!
//! Wraps a `fastembed::TextEmbedding` (nomic-embed-text-v1.5, 768d) behind
//! an `EmbeddingClient` trait so extraction and retrieval can swap in a
//! deterministic mock during tests.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{Error, Result};

/// Batch chunk size; implementations must preserve input order across
/// chunk boundaries (spec §4.5).
pub const DEFAULT_BATCH_SIZE: usize = 32;

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embeds a single text into a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds many texts, internally chunking into batches of
    /// `batch_size()` and preserving input order across chunks.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size()) {
            for text in chunk {
                out.push(self.embed(text).await?);
            }
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize;

    fn batch_size(&self) -> usize {
        DEFAULT_BATCH_SIZE
    }
}

/// Cosine similarity between two equal-length vectors. Used by the
/// retrieval engine's exact cosine `reduce` (spec §4.4) rather than an
/// approximate ANN index, so repeated searches with no intervening writes
/// are bit-for-bit idempotent (testable property 5).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(feature = "embeddings")]
pub struct LocalEmbeddingClient {
    model: Mutex<fastembed::TextEmbedding>,
    dimensions: usize,
}

#[cfg(feature = "embeddings")]
impl LocalEmbeddingClient {
    /// Initializes nomic-embed-text-v1.5, downloading/caching ONNX weights
    /// under `cache_dir` (or the platform cache directory when `None`).
    pub fn new(cache_dir: Option<std::path::PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.unwrap_or_else(default_cache_dir);
        std::fs::create_dir_all(&cache_dir).map_err(|e| Error::config(e.to_string()))?;

        let options = fastembed::InitOptions::new(fastembed::EmbeddingModel::NomicEmbedTextV15)
            .with_cache_dir(cache_dir);
        let model = fastembed::TextEmbedding::try_new(options)
            .map_err(|e| Error::config(format!("failed to initialize embedding model: {e}")))?;
        Ok(Self {
            model: Mutex::new(model),
            dimensions: 768,
        })
    }
}

#[cfg(feature = "embeddings")]
fn default_cache_dir() -> std::path::PathBuf {
    if let Ok(path) = std::env::var("FASTEMBED_CACHE_PATH") {
        return std::path::PathBuf::from(path);
    }
    directories::ProjectDirs::from("ai", "graphzep", "graphzep")
        .map(|d| d.cache_dir().join("fastembed"))
        .unwrap_or_else(|| std::path::PathBuf::from(".fastembed_cache"))
}

#[cfg(feature = "embeddings")]
#[async_trait]
impl EmbeddingClient for LocalEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_string();
        let mut model = self.model.lock().expect("embedding model poisoned");
        let mut vectors = model
            .embed(vec![text], None)
            .map_err(|e| Error::backend(format!("embedding failed: {e}")))?;
        vectors.pop().ok_or_else(|| Error::backend("embedding model returned no vectors"))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// HTTP embedding adapter against an OpenAI-compatible `/embeddings`
/// endpoint, for deployments that set `OPENAI_API_KEY` / `OPENAI_BASE_URL`
/// rather than running local ONNX inference (spec §6).
#[cfg(feature = "remote-llm")]
pub struct OpenAiEmbeddingClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[cfg(feature = "remote-llm")]
impl OpenAiEmbeddingClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            dimensions,
        }
    }
}

#[cfg(feature = "remote-llm")]
#[derive(serde::Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[cfg(feature = "remote-llm")]
#[derive(serde::Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingDatum>,
}

#[cfg(feature = "remote-llm")]
#[derive(serde::Deserialize)]
struct OpenAiEmbeddingDatum {
    embedding: Vec<f32>,
}

#[cfg(feature = "remote-llm")]
#[async_trait]
impl EmbeddingClient for OpenAiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_batch(std::slice::from_ref(&text.to_string())).await?.remove(0))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size()) {
            let response = self
                .client
                .post(format!("{}/embeddings", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&OpenAiEmbeddingRequest { model: &self.model, input: chunk })
                .send()
                .await
                .map_err(|e| Error::transport(format!("embedding request failed: {e}")))?;
            if !response.status().is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::backend(format!("embedding endpoint returned an error: {body}")));
            }
            let parsed: OpenAiEmbeddingResponse = response
                .json()
                .await
                .map_err(|e| Error::backend(format!("malformed embedding response: {e}")))?;
            out.extend(parsed.data.into_iter().map(|d| d.embedding));
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Deterministic, dependency-free embedding for tests: hashes the input
/// text into a fixed-length vector so equal inputs always produce equal
/// vectors and near-duplicate inputs land close in cosine space often
/// enough to exercise ranking logic.
pub struct MockEmbeddingClient {
    dimensions: usize,
}

impl MockEmbeddingClient {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbeddingClient {
    fn default() -> Self {
        Self::new(32)
    }
}

#[async_trait]
impl EmbeddingClient for MockEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimensions];
        for (i, byte) in text.bytes().enumerate() {
            let slot = i % self.dimensions;
            vector[slot] += (byte as f32) / 255.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = vec![0.1, 0.2, 0.3];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn mock_embedding_is_deterministic() {
        let client = MockEmbeddingClient::default();
        let a = client.embed("hello world").await.unwrap();
        let b = client.embed("hello world").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn batch_embedding_preserves_order_across_chunks() {
        let client = MockEmbeddingClient::new(8);
        let texts: Vec<String> = (0..70).map(|i| format!("text-{i}")).collect();
        let individually: Vec<Vec<f32>> = {
            let mut out = Vec::new();
            for t in &texts {
                out.push(client.embed(t).await.unwrap());
            }
            out
        };
        let batched = client.embed_batch(&texts).await.unwrap();
        assert_eq!(batched, individually);
    }
}
