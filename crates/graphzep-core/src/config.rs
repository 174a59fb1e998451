//! Runtime configuration (spec §6)
//!
//! Loaded from environment variables (optionally via a `.env` file through
//! `dotenvy`, read before anything else runs). Fails fast with
//! `Error::config` on a missing required variable rather than deferring to
//! first use.

use crate::error::{Error, Result};

/// Default HTTP port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model_name: String,
    pub embedding_model_name: String,
    pub neo4j_uri: Option<String>,
    pub neo4j_user: Option<String>,
    pub neo4j_password: Option<String>,
    pub falkordb_uri: Option<String>,
    pub port: u16,
}

impl Config {
    /// Loads `.env` (if present) then reads the process environment.
    /// `OPENAI_API_KEY` is the only variable with no usable default: every
    /// other variable falls back to a value that lets a local, LLM-free
    /// deployment (the `MockLanguageClient`/`MockEmbeddingClient` path)
    /// start up.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let openai_api_key = std::env::var("OPENAI_API_KEY").map_err(|_| Error::config("OPENAI_API_KEY is required").with_field("OPENAI_API_KEY"))?;
        let openai_base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model_name = std::env::var("MODEL_NAME").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let embedding_model_name = std::env::var("EMBEDDING_MODEL_NAME").unwrap_or_else(|_| "text-embedding-3-small".to_string());
        let neo4j_uri = std::env::var("NEO4J_URI").ok();
        let neo4j_user = std::env::var("NEO4J_USER").ok();
        let neo4j_password = std::env::var("NEO4J_PASSWORD").ok();
        let falkordb_uri = std::env::var("FALKORDB_URI").ok();
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| Error::config(format!("PORT must be a valid port number, got {raw:?}")).with_field("PORT"))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            openai_api_key,
            openai_base_url,
            model_name,
            embedding_model_name,
            neo4j_uri,
            neo4j_user,
            neo4j_password,
            falkordb_uri,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn missing_api_key_fails_fast() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("OPENAI_API_KEY");
        let err = Config::from_env().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Config);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("PORT", "not-a-port");
        let err = Config::from_env().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Config);
        std::env::remove_var("PORT");
        std::env::remove_var("OPENAI_API_KEY");
    }

    #[test]
    fn port_defaults_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::remove_var("PORT");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
        std::env::remove_var("OPENAI_API_KEY");
    }
}
