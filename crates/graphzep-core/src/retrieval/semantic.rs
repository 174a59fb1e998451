//! Semantic search (C10)
//!
//! Cosine similarity computed with the exact `reduce`-style fold from
//! [`crate::adapters::embedding::cosine_similarity`] rather than an
//! approximate index, so repeated searches are bit-for-bit idempotent
//! (testable property 5).

use super::{Candidate, ScoredResult};
use crate::adapters::embedding::cosine_similarity;

const MIN_SIMILARITY: f32 = 0.1;

/// Embeds nothing itself — the caller supplies `query_embedding`. Filters
/// candidates with similarity > 0.1 and returns the top `limit` by
/// similarity descending.
pub fn semantic_search(candidates: &[Candidate], query_embedding: &[f32], limit: usize) -> Vec<ScoredResult> {
    let mut scored: Vec<ScoredResult> = candidates
        .iter()
        .filter_map(|c| {
            let embedding = c.embedding.as_ref()?;
            let score = cosine_similarity(embedding, query_embedding);
            (score > MIN_SIMILARITY).then_some(ScoredResult { id: c.id, score })
        })
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn candidate(embedding: Vec<f32>) -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            content: String::new(),
            embedding: Some(embedding),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn filters_below_similarity_floor() {
        let candidates = vec![candidate(vec![1.0, 0.0]), candidate(vec![0.0, 1.0])];
        let results = semantic_search(&candidates, &[1.0, 0.0], 10);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn two_runs_with_no_writes_are_identical() {
        let candidates = vec![candidate(vec![1.0, 0.0]), candidate(vec![0.9, 0.1])];
        let first = semantic_search(&candidates, &[1.0, 0.0], 10);
        let second = semantic_search(&candidates, &[1.0, 0.0], 10);
        assert_eq!(first, second);
    }
}
