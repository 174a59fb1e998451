//! Retrieval engine (C10)
//!
//! Implements the `search(params)` operation from spec §4.10: semantic,
//! keyword, hybrid (RRF), and MMR search types, optional graph-boost
//! rerank, and temporal filtering. Candidate fetch (querying storage by
//! session/user/memory-type/time-range) is the caller's job — this module
//! takes an already-fetched candidate slice and ranks it, operating purely
//! on in-memory score lists.

pub mod graph_boost;
pub mod hybrid;
pub mod keyword;
pub mod mmr;
pub mod semantic;
pub mod temporal;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// A memory node eligible for ranking.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: Uuid,
    pub content: String,
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

/// A ranked result: the candidate id and its final score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
    pub id: Uuid,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Semantic,
    Keyword,
    Hybrid,
    Mmr,
}

#[derive(Debug, Clone)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub limit: usize,
    pub search_type: SearchType,
    pub min_relevance: Option<f32>,
    pub time_range: Option<TimeRange>,
    pub graph_boost: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            limit: 20,
            search_type: SearchType::Hybrid,
            min_relevance: None,
            time_range: None,
            graph_boost: false,
        }
    }
}

/// Ranks `candidates` against `params`, applying temporal filtering first,
/// then the requested search type, then (optionally) graph-boost rerank,
/// then the `min_relevance`/`limit` post-processing common to every type.
pub fn search(
    candidates: &[Candidate],
    query_embedding: Option<&[f32]>,
    params: &SearchParams,
    edge_counts: Option<&HashMap<Uuid, usize>>,
) -> Vec<ScoredResult> {
    let filtered: Vec<Candidate> = match &params.time_range {
        Some(range) => candidates
            .iter()
            .filter(|c| temporal::in_range(c.created_at, range.start, range.end))
            .cloned()
            .collect(),
        None => candidates.to_vec(),
    };

    let mut results = match params.search_type {
        SearchType::Semantic => {
            let Some(qe) = query_embedding else { return Vec::new() };
            semantic::semantic_search(&filtered, qe, params.limit)
        }
        SearchType::Keyword => keyword::keyword_search(&filtered, &params.query, params.limit),
        SearchType::Hybrid => {
            let Some(qe) = query_embedding else {
                return keyword::keyword_search(&filtered, &params.query, params.limit);
            };
            let semantic_results = semantic::semantic_search(&filtered, qe, filtered.len());
            let keyword_results = keyword::keyword_search(&filtered, &params.query, filtered.len());
            hybrid::fuse(&keyword_results, &semantic_results, 60.0)
                .into_iter()
                .take(params.limit)
                .collect()
        }
        SearchType::Mmr => {
            let Some(qe) = query_embedding else { return Vec::new() };
            mmr::mmr_search(&filtered, qe, params.limit, 0.5)
        }
    };

    if params.graph_boost {
        if let Some(edge_counts) = edge_counts {
            graph_boost::rerank(&mut results, edge_counts);
        }
    }

    if let Some(min_relevance) = params.min_relevance {
        results.retain(|r| r.score >= min_relevance);
    }
    results.truncate(params.limit);
    results
}
