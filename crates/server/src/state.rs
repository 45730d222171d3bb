//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use pragna_agent::{
    ChatRelay, ConversationStore, OrchestratorConfig, RelayConfig, ResponseOrchestrator,
};
use pragna_config::Settings;
use pragna_llm::{GroqBackend, GroqConfig, LlmBackend, LlmError};
use pragna_pipeline::{
    GoogleTts, GoogleTtsConfig, GroqWhisperConfig, GroqWhisperStt, SttBackend, SttError,
    TtsBackend, TtsError,
};
use thiserror::Error;

/// Failures while wiring the collaborators at startup
#[derive(Error, Debug)]
pub enum StateError {
    #[error("chat backend: {0}")]
    Llm(#[from] LlmError),

    #[error("transcription backend: {0}")]
    Stt(#[from] SttError),

    #[error("speech backend: {0}")]
    Tts(#[from] TtsError),
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration loaded at startup
    pub config: Arc<Settings>,
    pub relay: Arc<ChatRelay>,
    /// Prometheus handle; `None` disables `/metrics`
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the hosted Groq and Google collaborators from `config`
    pub fn new(config: Settings) -> Result<Self, StateError> {
        let llm: Arc<dyn LlmBackend> = Arc::new(GroqBackend::new(GroqConfig::from(&config.llm))?);
        let stt: Arc<dyn SttBackend> = Arc::new(GroqWhisperStt::new(
            GroqWhisperConfig::from_settings(&config.stt, config.llm.api_key.clone()),
        )?);
        let tts: Arc<dyn TtsBackend> =
            Arc::new(GoogleTts::new(GoogleTtsConfig::from(&config.tts))?);

        Ok(Self::with_backends(config, llm, stt, tts))
    }

    /// Build state around caller-supplied backends
    pub fn with_backends(
        config: Settings,
        llm: Arc<dyn LlmBackend>,
        stt: Arc<dyn SttBackend>,
        tts: Arc<dyn TtsBackend>,
    ) -> Self {
        let history = Arc::new(ConversationStore::from_config(&config.history));
        let orchestrator =
            ResponseOrchestrator::new(llm, history, OrchestratorConfig::from(&config));
        let relay = ChatRelay::new(orchestrator, stt, tts, RelayConfig::from(&config));

        Self {
            config: Arc::new(config),
            relay: Arc::new(relay),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Users with a live conversation
    pub fn active_users(&self) -> usize {
        self.relay.orchestrator().history().user_count()
    }
}
