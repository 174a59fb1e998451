//! Keyword search (C10)
//!
//! Case-insensitive substring match against each query term; ties (equal
//! `created_at`, or no match at all among candidates) keep the stable
//! input order so fusion with semantic results (spec testable property 6)
//! is deterministic.

use super::{Candidate, ScoredResult};

/// Every hit scores 1.0 (spec §4.10); ordering is by `created_at`
/// descending, ties broken by input order (a stable sort preserves this).
pub fn keyword_search(candidates: &[Candidate], query: &str, limit: usize) -> Vec<ScoredResult> {
    let terms: Vec<String> = query.to_lowercase().split_whitespace().map(String::from).collect();
    if terms.is_empty() {
        return Vec::new();
    }

    let mut matched: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| {
            let lower = c.content.to_lowercase();
            terms.iter().any(|t| lower.contains(t.as_str()))
        })
        .collect();
    matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    matched
        .into_iter()
        .take(limit)
        .map(|c| ScoredResult { id: c.id, score: 1.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn candidate(content: &str, created_at: chrono::DateTime<Utc>) -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            content: content.to_string(),
            embedding: None,
            created_at,
        }
    }

    #[test]
    fn matches_are_case_insensitive_and_scored_one() {
        let now = Utc::now();
        let candidates = vec![candidate("Python is great", now)];
        let results = keyword_search(&candidates, "python", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn newer_memories_rank_first() {
        let now = Utc::now();
        let older = candidate("python snippet", now - Duration::days(1));
        let newer = candidate("python snippet", now);
        let results = keyword_search(&[older.clone(), newer.clone()], "python", 10);
        assert_eq!(results[0].id, newer.id);
        assert_eq!(results[1].id, older.id);
    }
}
