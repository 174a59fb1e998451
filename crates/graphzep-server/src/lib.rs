//! HTTP ingestion surface for graphzep-core (spec §6).
//!
//! A thin axum layer: request/response shapes, an in-process FIFO queue
//! ([`queue`]) that is the only place ingestion ordering is guaranteed, and
//! error mapping ([`error`]) from `graphzep_core::Error` onto status codes.
//! All state lives in a single [`AppState`] built once at startup — no
//! module-level statics.

pub mod error;
pub mod queue;
pub mod routes;

use std::sync::Arc;

use graphzep_core::Engine;

use crate::queue::IngestQueue;

/// Shared state every handler receives through axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub queue: IngestQueue,
}

impl AppState {
    pub fn new(engine: Arc<Engine>) -> Self {
        let queue = IngestQueue::spawn(engine.clone());
        Self { engine, queue }
    }
}

/// Builds the router described in spec §6. Separate from `main` so
/// integration tests can mount it directly with `tower::ServiceExt::oneshot`.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::routing::{delete, get, post};

    axum::Router::new()
        .route("/healthcheck", get(routes::healthcheck))
        .route("/messages", post(routes::post_messages))
        .route("/search", post(routes::post_search))
        .route("/get-memory", post(routes::post_get_memory))
        .route("/episodes/{group_id}", get(routes::get_episodes))
        .route("/group/{group_id}", delete(routes::delete_group))
        .route("/clear", post(routes::post_clear))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}
