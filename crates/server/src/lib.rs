//! Pragna Server
//!
//! HTTP front end for the multilingual chat relay: JSON chat endpoints,
//! audio upload, speech synthesis, status, Prometheus metrics and the static
//! web client.

pub mod http;
pub mod metrics;
pub mod state;

pub use crate::http::create_router;
pub use crate::metrics::{init_metrics, record_error, record_request};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Synthesis(String),
}

impl ServerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Synthesis(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Synthesis(_) => "synthesis",
        }
    }

    /// Message shown to clients; internal details stay in the logs
    fn public_message(&self) -> String {
        match self {
            ServerError::InvalidRequest(message) => message.clone(),
            ServerError::Synthesis(_) => "Speech synthesis failed".to_string(),
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        err.status()
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        record_error(self.kind());

        (
            status,
            Json(serde_json::json!({ "error": self.public_message() })),
        )
            .into_response()
    }
}
