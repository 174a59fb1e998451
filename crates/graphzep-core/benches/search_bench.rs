//! graphzep-core retrieval benchmarks.
//!
//! Benchmarks the hot paths of the retrieval engine (C10): cosine
//! similarity, keyword matching, RRF fusion, and MMR diversification.
//! Run with: cargo bench -p graphzep-core

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use graphzep_core::adapters::embedding::cosine_similarity;
use graphzep_core::retrieval::{hybrid, keyword, mmr, Candidate, ScoredResult};
use uuid::Uuid;

fn embedding(dims: usize, seed: usize) -> Vec<f32> {
    (0..dims).map(|i| ((seed * dims + i) as f32).sin()).collect()
}

fn candidates(n: usize, dims: usize) -> Vec<Candidate> {
    (0..n)
        .map(|i| Candidate {
            id: Uuid::new_v4(),
            content: format!("candidate body number {i} mentions alice and bob"),
            embedding: Some(embedding(dims, i)),
            created_at: Utc::now() - Duration::minutes(i as i64),
        })
        .collect()
}

fn bench_cosine_similarity(c: &mut Criterion) {
    let a = embedding(1536, 1);
    let b = embedding(1536, 2);
    c.bench_function("cosine_similarity_1536d", |bch| bch.iter(|| black_box(cosine_similarity(&a, &b))));
}

fn bench_keyword_search(c: &mut Criterion) {
    let pool = candidates(200, 32);
    c.bench_function("keyword_search_200", |bch| bch.iter(|| black_box(keyword::keyword_search(&pool, "alice bob", 20))));
}

fn bench_rrf_fusion(c: &mut Criterion) {
    let keyword_results: Vec<ScoredResult> = (0..50).map(|i| ScoredResult { id: Uuid::new_v4(), score: 1.0 - i as f32 / 50.0 }).collect();
    let semantic_results: Vec<ScoredResult> = (0..50).map(|i| ScoredResult { id: Uuid::new_v4(), score: 1.0 - i as f32 / 50.0 }).collect();
    c.bench_function("rrf_fuse_50x50", |bch| bch.iter(|| black_box(hybrid::fuse(&keyword_results, &semantic_results, 60.0))));
}

fn bench_mmr_search(c: &mut Criterion) {
    let pool = candidates(200, 256);
    let query = embedding(256, 0);
    c.bench_function("mmr_search_200_to_20", |bch| bch.iter(|| black_box(mmr::mmr_search(&pool, &query, 20, 0.5))));
}

criterion_group!(benches, bench_cosine_similarity, bench_keyword_search, bench_rrf_fusion, bench_mmr_search);
criterion_main!(benches);
