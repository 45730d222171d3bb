//! Chat completion integration
//!
//! Features:
//! - `LlmBackend` trait for pluggable completion services
//! - Groq backend (OpenAI-compatible chat completions API)
//! - Language-aware prompt building
//! - Failure classification for user-facing fallbacks

pub mod backend;
pub mod prompt;

pub use backend::{
    FinishReason, GenerateRequest, GenerationResult, GroqBackend, GroqConfig, LlmBackend,
};
pub use prompt::{system_prompt, Message, PromptBuilder, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_decode() {
            LlmError::InvalidResponse(err.to_string())
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

/// Coarse failure classes, each with its own user-facing reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No usable credentials for the completion service
    NotConfigured,
    /// The service did not answer within the timeout
    TimedOut,
    /// Transport failure, error status or malformed payload
    Failed,
}

impl FailureKind {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NotConfigured => "not_configured",
            FailureKind::TimedOut => "timeout",
            FailureKind::Failed => "error",
        }
    }
}

impl LlmError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LlmError::Unauthenticated(_) => FailureKind::NotConfigured,
            LlmError::Timeout => FailureKind::TimedOut,
            LlmError::Network(_)
            | LlmError::Api { .. }
            | LlmError::InvalidResponse(_)
            | LlmError::Configuration(_) => FailureKind::Failed,
        }
    }
}
