//! graphzep-server: the thin ingestion HTTP surface from spec §6.
//!
//! Loads configuration (fail-fast on a missing `OPENAI_API_KEY`), builds
//! one [`Engine`] backed by the configured adapters, and serves the
//! `/healthcheck`, `/messages`, `/search`, `/get-memory`, `/episodes/:group_id`,
//! `/group/:group_id`, `/clear` routes over it.

use std::sync::Arc;

use graphzep_core::adapters::embedding::OpenAiEmbeddingClient;
use graphzep_core::adapters::language::OpenAiLanguageClient;
use graphzep_core::adapters::{EmbeddingClient, LanguageClient};
use graphzep_core::config::Config;
use graphzep_core::{Engine, EngineOptions};
use graphzep_server::{build_router, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let embedding: Box<dyn EmbeddingClient> = Box::new(OpenAiEmbeddingClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.embedding_model_name.clone(),
        1536,
    ));
    let language: Box<dyn LanguageClient> =
        Box::new(OpenAiLanguageClient::new(config.openai_api_key.clone(), config.openai_base_url.clone(), config.model_name.clone()));

    let engine = match Engine::open(EngineOptions::default(), embedding, language) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!(error = %e, "failed to open engine");
            std::process::exit(1);
        }
    };

    let state = AppState::new(engine);
    let router = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "graphzep-server listening");
    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
