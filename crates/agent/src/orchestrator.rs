//! Response orchestration
//!
//! Turns one user message into one assistant reply: builds the prompt from
//! the user's recent history, calls the chat backend under a timeout, and
//! records the exchange on success. Failures never escape; each failure kind
//! maps to a fixed reply the user sees instead.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pragna_config::Settings;
use pragna_core::{preview, Language};
use pragna_llm::{
    FailureKind, FinishReason, GenerateRequest, GenerationResult, LlmBackend, LlmError,
    PromptBuilder,
};
use tokio::time::error::Elapsed;

use crate::history::ConversationStore;

/// Reply when no usable API key is configured
pub const NOT_CONFIGURED_REPLY: &str =
    "Sorry, the AI service is not configured. Please set GROQ_API_KEY.";
/// Reply when the chat service does not answer in time
pub const TIMEOUT_REPLY: &str = "Sorry, the request timed out. Please try again.";
/// Reply for every other failure
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again later.";

/// User-facing reply for a failure kind
pub fn fallback_reply(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::NotConfigured => NOT_CONFIGURED_REPLY,
        FailureKind::TimedOut => TIMEOUT_REPLY,
        FailureKind::Failed => ERROR_REPLY,
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// History entries placed between the system prompt and the new message
    pub context_messages: usize,
    /// Upper bound on one completion call
    pub timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            context_messages: 10,
            timeout: Duration::from_secs(60),
        }
    }
}

impl From<&Settings> for OrchestratorConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            context_messages: settings.history.context_messages,
            timeout: settings.llm.timeout(),
        }
    }
}

pub struct ResponseOrchestrator {
    llm: Arc<dyn LlmBackend>,
    history: Arc<ConversationStore>,
    config: OrchestratorConfig,
}

impl ResponseOrchestrator {
    pub fn new(
        llm: Arc<dyn LlmBackend>,
        history: Arc<ConversationStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            llm,
            history,
            config,
        }
    }

    pub fn history(&self) -> &Arc<ConversationStore> {
        &self.history
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Reply to `message` in `language` for `user_id`.
    ///
    /// On success the trimmed reply is returned and the exchange (user entry,
    /// then assistant entry) is appended to the user's history. On failure
    /// nothing is appended and a fixed fallback reply is returned.
    pub async fn get_response(&self, message: &str, language: Language, user_id: &str) -> String {
        match self.generate(message, language, user_id).await {
            Ok(reply) => {
                self.history.append_exchange(user_id, message, reply.as_str());
                reply
            }
            Err(e) => {
                let kind = e.kind();
                tracing::error!(
                    user_id,
                    error = %e,
                    kind = kind.as_str(),
                    "Chat completion failed, returning fallback reply"
                );
                metrics::counter!("pragna_fallback_replies_total", "kind" => kind.as_str())
                    .increment(1);
                fallback_reply(kind).to_string()
            }
        }
    }

    async fn generate(
        &self,
        message: &str,
        language: Language,
        user_id: &str,
    ) -> Result<String, LlmError> {
        let context = self
            .history
            .read_recent(user_id, self.config.context_messages);
        let messages = PromptBuilder::new(language)
            .with_history(context)
            .with_user_message(message)
            .build();

        tracing::info!(
            user_id,
            language = language.code(),
            messages = messages.len(),
            preview = preview(message, 50),
            "Generating response"
        );

        let request = GenerateRequest::new(messages);
        let start = Instant::now();
        let outcome = tokio::time::timeout(self.config.timeout, self.llm.generate(&request)).await;
        metrics::histogram!("pragna_llm_latency_seconds", "outcome" => latency_outcome(&outcome))
            .record(start.elapsed().as_secs_f64());
        let result = outcome.map_err(|_| LlmError::Timeout)??;

        if result.finish_reason == FinishReason::Length {
            tracing::warn!(user_id, tokens = result.tokens, "Reply cut off at the token limit");
        }
        tracing::info!(
            user_id,
            tokens = result.tokens,
            elapsed_ms = result.total_time_ms,
            finish_reason = ?result.finish_reason,
            preview = preview(&result.text, 100),
            "Response generated"
        );

        Ok(result.text.trim().to_string())
    }

    /// Whether the chat service answers with the configured credentials
    pub async fn is_available(&self) -> bool {
        self.llm.is_available().await
    }

    /// Forget everything said by `user_id`
    pub fn clear_history(&self, user_id: &str) {
        let existed = self.history.clear(user_id);
        tracing::info!(user_id, existed, "Cleared conversation history");
    }
}

/// Label for the latency histogram; every attempt is recorded, failures included
fn latency_outcome(outcome: &Result<Result<GenerationResult, LlmError>, Elapsed>) -> &'static str {
    match outcome {
        Ok(Ok(_)) => "ok",
        Ok(Err(e)) => e.kind().as_str(),
        Err(_) => FailureKind::TimedOut.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_replies() {
        assert_eq!(
            fallback_reply(FailureKind::NotConfigured),
            "Sorry, the AI service is not configured. Please set GROQ_API_KEY."
        );
        assert_eq!(
            fallback_reply(FailureKind::TimedOut),
            "Sorry, the request timed out. Please try again."
        );
        assert_eq!(
            fallback_reply(FailureKind::Failed),
            "Sorry, I encountered an error. Please try again later."
        );
    }

    #[tokio::test]
    async fn test_latency_outcome_covers_failures() {
        let ok: Result<Result<GenerationResult, LlmError>, Elapsed> = Ok(Ok(GenerationResult {
            text: "hi".into(),
            tokens: 1,
            total_time_ms: 1,
            finish_reason: FinishReason::Stop,
        }));
        assert_eq!(latency_outcome(&ok), "ok");

        let unauthenticated = Ok(Err(LlmError::Unauthenticated("HTTP 401".into())));
        assert_eq!(latency_outcome(&unauthenticated), "not_configured");

        let api = Ok(Err(LlmError::Api {
            status: 500,
            message: "boom".into(),
        }));
        assert_eq!(latency_outcome(&api), "error");

        let elapsed = tokio::time::timeout(Duration::ZERO, std::future::pending::<()>())
            .await
            .unwrap_err();
        assert_eq!(latency_outcome(&Err(elapsed)), "timeout");
    }

    #[test]
    fn test_config_from_settings() {
        let mut settings = Settings::default();
        settings.history.context_messages = 4;
        settings.llm.timeout_seconds = 7;
        let config = OrchestratorConfig::from(&settings);
        assert_eq!(config.context_messages, 4);
        assert_eq!(config.timeout, Duration::from_secs(7));
    }
}
