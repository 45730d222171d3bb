//! Prometheus metrics
//!
//! The relay records through the `metrics` facade; this module installs the
//! Prometheus recorder and serves its rendering on `/metrics`.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

/// Install the global Prometheus recorder.
///
/// Returns `None` when a recorder is already installed (e.g. a second call in
/// the same process).
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            describe_metrics();
            Some(handle)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
}

fn describe_metrics() {
    ::metrics::describe_counter!("pragna_requests_total", "API requests by endpoint");
    ::metrics::describe_counter!("pragna_errors_total", "Error responses by kind");
    ::metrics::describe_counter!(
        "pragna_fallback_replies_total",
        "Fallback replies returned instead of a model answer"
    );
    ::metrics::describe_histogram!(
        "pragna_llm_latency_seconds",
        ::metrics::Unit::Seconds,
        "Chat completion latency by outcome"
    );
    ::metrics::describe_histogram!(
        "pragna_stt_latency_seconds",
        ::metrics::Unit::Seconds,
        "Transcription latency"
    );
    ::metrics::describe_histogram!(
        "pragna_tts_latency_seconds",
        ::metrics::Unit::Seconds,
        "Speech synthesis latency"
    );
}

pub fn record_request(endpoint: &'static str) {
    ::metrics::counter!("pragna_requests_total", "endpoint" => endpoint).increment(1);
}

pub fn record_error(kind: &'static str) {
    ::metrics::counter!("pragna_errors_total", "kind" => kind).increment(1);
}

/// `GET /metrics`
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
