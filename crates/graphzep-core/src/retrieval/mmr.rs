//! Maximal Marginal Relevance (C10)
//!
//! Balances query relevance against diversity among already-selected
//! results. Seeded with the top semantic hit, then greedily adds whichever
//! remaining candidate maximizes `lambda * relevance - (1 - lambda) *
//! max_similarity_to_selected`, per spec §4.10 / scenario D.

use super::{Candidate, ScoredResult};
use crate::adapters::embedding::cosine_similarity;

/// Candidate pool considered before MMR re-selection: `3 * limit`, wide
/// enough that diversity has real alternatives to pick from without
/// ranking the entire candidate set.
const POOL_MULTIPLIER: usize = 3;

pub fn mmr_search(candidates: &[Candidate], query_embedding: &[f32], limit: usize, lambda: f32) -> Vec<ScoredResult> {
    let pool_size = limit.saturating_mul(POOL_MULTIPLIER);
    let mut pool: Vec<(&Candidate, f32)> = candidates
        .iter()
        .filter_map(|c| {
            let embedding = c.embedding.as_ref()?;
            Some((c, cosine_similarity(embedding, query_embedding)))
        })
        .collect();
    pool.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    pool.truncate(pool_size.max(limit));

    if pool.is_empty() {
        return Vec::new();
    }

    let mut selected: Vec<(&Candidate, f32)> = Vec::new();
    selected.push(pool.remove(0));

    while selected.len() < limit && !pool.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f32::MIN;
        for (idx, (candidate, relevance)) in pool.iter().enumerate() {
            let max_sim = selected
                .iter()
                .map(|(s, _)| {
                    let (Some(a), Some(b)) = (candidate.embedding.as_ref(), s.embedding.as_ref()) else {
                        return 0.0;
                    };
                    cosine_similarity(a, b)
                })
                .fold(0.0_f32, f32::max);
            let mmr_score = lambda * relevance - (1.0 - lambda) * max_sim;
            if mmr_score > best_score {
                best_score = mmr_score;
                best_idx = idx;
            }
        }
        selected.push(pool.remove(best_idx));
    }

    selected
        .into_iter()
        .map(|(c, relevance)| ScoredResult { id: c.id, score: relevance })
        .collect()
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
    fn prefers_diverse_second_pick_over_near_duplicate() {
        let query = vec![1.0, 0.0, 0.0];
        let top = candidate(vec![1.0, 0.0, 0.0]);
        let near_duplicate = candidate(vec![0.99, 0.01, 0.0]);
        let diverse = candidate(vec![0.5, 0.5, 0.0]);
        let candidates = vec![top.clone(), near_duplicate.clone(), diverse.clone()];

        let results = mmr_search(&candidates, &query, 2, 0.5);
        assert_eq!(results[0].id, top.id);
        assert_eq!(results[1].id, diverse.id, "a near-duplicate of the seed should lose to a diverse alternative");
    }

    #[test]
    fn respects_limit() {
        let query = vec![1.0, 0.0];
        let candidates: Vec<Candidate> = (0..10).map(|i| candidate(vec![1.0 - i as f32 * 0.01, i as f32 * 0.01])).collect();
        let results = mmr_search(&candidates, &query, 3, 0.5);
        assert_eq!(results.len(), 3);
    }
}
