//! Error taxonomy (spec §7)
//!
//! A single enum shared across adapters and the engine, covering the full
//! kind set this crate needs: `Config`, `Validation`, `Transport`,
//! `Backend`, `Extraction`, `Ontology`, `NotFound`, `Conflict`.

use std::fmt;

/// The kind of failure, independent of the message — callers branch on this
/// to decide whether to retry (see `is_retryable`).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Validation,
    Transport,
    Backend,
    Extraction,
    Ontology,
    NotFound,
    Conflict,
    /// Malformed pattern/SPARQL-subset query text (spec §4.4). Carries the
    /// offending token range in the message.
    QueryShape,
}

/// A user-visible failure: a kind, a message, and an optional offending
/// field path.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind:?}: {message}{}", field_suffix(.field.as_deref()))]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub field: Option<String>,
}

fn field_suffix(field: Option<&str>) -> String {
    match field {
        Some(f) => format!(" (field: {f})"),
        None => String::new(),
    }
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Backend, message)
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Extraction, message)
    }

    pub fn ontology(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Ontology, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn query_shape(message: impl Into<String>, token_range: (usize, usize)) -> Self {
        Self::new(
            ErrorKind::QueryShape,
            format!("{} (tokens {}..{})", message.into(), token_range.0, token_range.1),
        )
    }

    /// Recovery policy from spec §7: only idempotent reads/MERGE-style
    /// writes on `Transport` failures are retried, and at most once.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::QueryReturnedNoRows => Error::not_found(e.to_string()),
            rusqlite::Error::SqliteFailure(ref sqlite_err, _)
                if sqlite_err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::conflict(e.to_string())
            }
            other => Error::backend(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

pub type Result<T> = std::result::Result<T, Error>;
