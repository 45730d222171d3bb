//! LLM Backend implementations
//!
//! Groq serves an OpenAI-compatible chat completions API, so the backend here
//! works against any endpoint speaking that protocol (OpenAI, vLLM, local
//! servers). Requests are single-shot: no retries, no streaming.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use pragna_config::LlmSettings;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::prompt::Message;
use crate::LlmError;

/// Chat completion request
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Messages for chat completion
    pub messages: Vec<Message>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Temperature (0.0 - 2.0)
    pub temperature: f32,
    /// Top-p sampling
    pub top_p: f32,
}

impl GenerateRequest {
    /// Request with the relay's standard sampling parameters
    /// (temperature 0.7, 1024 max tokens, top-p 0.9)
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            max_tokens: 1024,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

/// LLM generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Generated text
    pub text: String,
    /// Completion tokens reported by the service
    pub tokens: usize,
    /// Total generation time (ms)
    pub total_time_ms: u64,
    /// Finish reason
    pub finish_reason: FinishReason,
}

/// Finish reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Other,
}

/// LLM Backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a response
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerationResult, LlmError>;

    /// Check if the service is reachable with the configured credentials
    async fn is_available(&self) -> bool;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Configuration for the Groq backend
#[derive(Clone)]
pub struct GroqConfig {
    /// API endpoint (OpenAI-compatible base URL)
    pub endpoint: String,
    /// API key; calls fail with `Unauthenticated` when absent
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            model: "llama-3.1-8b-instant".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl From<&LlmSettings> for GroqConfig {
    fn from(settings: &LlmSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            api_key: settings
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty()),
            model: settings.model.clone(),
            timeout: settings.timeout(),
        }
    }
}

impl std::fmt::Debug for GroqConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Groq chat completion backend
#[derive(Clone)]
pub struct GroqBackend {
    config: GroqConfig,
    client: Client,
}

impl GroqBackend {
    /// Create new Groq backend
    pub fn new(config: GroqConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        if config.api_key.is_none() {
            tracing::warn!("GROQ_API_KEY not set - chat completions will not work");
        } else {
            tracing::info!(model = %config.model, "Chat completion backend initialized");
        }

        Ok(Self { config, client })
    }

    /// Get the full API URL for chat completions
    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::Unauthenticated("GROQ_API_KEY is not set".to_string()))
    }
}

#[async_trait]
impl LlmBackend for GroqBackend {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerationResult, LlmError> {
        let api_key = self.api_key()?;
        let start = Instant::now();

        let body = OpenAIChatRequest {
            model: &self.config.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            stream: false,
        };

        tracing::info!(
            model = %self.config.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                return Err(LlmError::Unauthenticated(format!("HTTP {}", status)));
            }
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let response: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        parse_completion(response, start.elapsed())
    }

    async fn is_available(&self) -> bool {
        let Ok(api_key) = self.api_key() else {
            return false;
        };
        let url = format!("{}/models", self.config.endpoint.trim_end_matches('/'));
        self.client
            .get(&url)
            .bearer_auth(api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

fn parse_completion(
    response: OpenAIChatResponse,
    elapsed: Duration,
) -> Result<GenerationResult, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

    let text = choice
        .message
        .content
        .ok_or_else(|| LlmError::InvalidResponse("Choice has no message content".to_string()))?;

    Ok(GenerationResult {
        text: text.trim().to_string(),
        tokens: response.usage.map(|u| u.completion_tokens).unwrap_or(0),
        total_time_ms: elapsed.as_millis() as u64,
        finish_reason: match choice.finish_reason.as_deref() {
            Some("stop") | None => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some(_) => FinishReason::Other,
        },
    })
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    completion_tokens: usize,
}
