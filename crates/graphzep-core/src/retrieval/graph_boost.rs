//! Graph-boost reranking (C10)
//!
//! Rewards results that sit in a denser neighborhood of the entity graph:
//! `score * (1 + 0.1 * ln(1 + edge_count))`, applied after the base search
//! type ranks candidates and before `min_relevance`/`limit` post-processing.

use std::collections::HashMap;
use uuid::Uuid;

use super::ScoredResult;

const BOOST_FACTOR: f32 = 0.1;

pub fn rerank(results: &mut [ScoredResult], edge_counts: &HashMap<Uuid, usize>) {
    for result in results.iter_mut() {
        let edges = edge_counts.get(&result.id).copied().unwrap_or(0);
        result.score *= 1.0 + BOOST_FACTOR * ((1 + edges) as f32).ln();
    }
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_edges_leaves_score_unchanged() {
        let id = Uuid::new_v4();
        let mut results = vec![ScoredResult { id, score: 1.0 }];
        rerank(&mut results, &HashMap::new());
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn more_edges_can_overtake_a_higher_base_score() {
        let sparse = Uuid::new_v4();
        let dense = Uuid::new_v4();
        let mut results = vec![ScoredResult { id: sparse, score: 1.0 }, ScoredResult { id: dense, score: 0.95 }];
        let mut edge_counts = HashMap::new();
        edge_counts.insert(dense, 50);
        rerank(&mut results, &edge_counts);
        assert_eq!(results[0].id, dense);
    }
}
