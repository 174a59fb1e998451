//! Hybrid search fusion (C10)
//!
//! Reciprocal Rank Fusion over semantic and keyword result sets — `k=60`
//! default and `1/(k + rank)` formula — producing this crate's
//! `ScoredResult`.

use std::collections::HashMap;
use uuid::Uuid;

use super::ScoredResult;

/// `score(d) = sum over result sets of 1/(k + rank_set(d))`. Commutative
/// over its two input slices (testable property 6): swapping which list is
/// "keyword" and which is "semantic" does not change the final ranking.
pub fn fuse(keyword_results: &[ScoredResult], semantic_results: &[ScoredResult], k: f32) -> Vec<ScoredResult> {
    let mut scores: HashMap<Uuid, f32> = HashMap::new();
    let mut order: Vec<Uuid> = Vec::new();

    for (rank, r) in keyword_results.iter().enumerate() {
        if !scores.contains_key(&r.id) {
            order.push(r.id);
        }
        *scores.entry(r.id).or_default() += 1.0 / (k + rank as f32);
    }
    for (rank, r) in semantic_results.iter().enumerate() {
        if !scores.contains_key(&r.id) {
            order.push(r.id);
        }
        *scores.entry(r.id).or_default() += 1.0 / (k + rank as f32);
    }

    let mut fused: Vec<ScoredResult> = order
        .into_iter()
        .map(|id| ScoredResult { id, score: scores[&id] })
        .collect();
    fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: Uuid, score: f32) -> ScoredResult {
        ScoredResult { id, score }
    }

    #[test]
    fn fusion_rewards_documents_in_both_lists() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let keyword = vec![result(a, 0.9), result(b, 0.8)];
        let semantic = vec![result(b, 0.95), result(c, 0.7)];
        let fused = fuse(&keyword, &semantic, 60.0);
        assert_eq!(fused[0].id, b, "b appears in both lists and should rank first");
    }

    #[test]
    fn fusion_is_commutative_over_its_inputs() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let list1 = vec![result(a, 0.9), result(b, 0.5)];
        let list2 = vec![result(b, 0.8), result(a, 0.4)];
        let forward: Vec<Uuid> = fuse(&list1, &list2, 60.0).into_iter().map(|r| r.id).collect();
        let backward: Vec<Uuid> = fuse(&list2, &list1, 60.0).into_iter().map(|r| r.id).collect();
        assert_eq!(forward, backward);
    }
}
