//! Maps `graphzep_core::Error` onto HTTP responses (spec §6: "server
//! errors are 5xx with `{error}`"; `{error}`'s status depends on the error
//! kind so validation/not-found surface as 4xx rather than 5xx).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use graphzep_core::ErrorKind;
use serde::Serialize;

pub struct ApiError(pub graphzep_core::Error);

impl From<graphzep_core::Error> for ApiError {
    fn from(e: graphzep_core::Error) -> Self {
        Self(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::QueryShape => StatusCode::BAD_REQUEST,
            ErrorKind::Config | ErrorKind::Transport | ErrorKind::Backend | ErrorKind::Extraction | ErrorKind::Ontology => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!(kind = ?self.0.kind, message = %self.0.message, "request failed");
        (status, Json(ErrorBody { error: self.0.message })).into_response()
    }
}
