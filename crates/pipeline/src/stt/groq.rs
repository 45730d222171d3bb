//! Groq Whisper transcription backend
//!
//! Posts the raw upload as multipart form data to an OpenAI-compatible
//! `/audio/transcriptions` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use pragna_config::SttSettings;
use pragna_core::Language;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;

use super::{AudioUpload, SttBackend, SttError};

/// Groq Whisper backend configuration
#[derive(Clone)]
pub struct GroqWhisperConfig {
    /// OpenAI-compatible base URL
    pub endpoint: String,
    /// API key (shared with chat completions)
    pub api_key: Option<String>,
    /// Whisper model identifier
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for GroqWhisperConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            model: "whisper-large-v3".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl GroqWhisperConfig {
    pub fn from_settings(settings: &SttSettings, api_key: Option<String>) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: settings.model.clone(),
            timeout: settings.timeout(),
        }
    }
}

impl std::fmt::Debug for GroqWhisperConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqWhisperConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Whisper transcription over HTTP
pub struct GroqWhisperStt {
    config: GroqWhisperConfig,
    client: Client,
}

impl GroqWhisperStt {
    pub fn new(config: GroqWhisperConfig) -> Result<Self, SttError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SttError::Network(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(model = %config.model, "Transcription backend initialized");

        Ok(Self { config, client })
    }

    fn transcription_url(&self) -> String {
        format!(
            "{}/audio/transcriptions",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    fn build_form(&self, audio: &AudioUpload, language: Option<Language>) -> multipart::Form {
        let part = || multipart::Part::bytes(audio.bytes.clone()).file_name(audio.filename.clone());
        let file = part().mime_str(&audio.content_type).unwrap_or_else(|_| {
            tracing::debug!(content_type = %audio.content_type, "Unparseable upload content type");
            part()
        });

        let mut form = multipart::Form::new()
            .part("file", file)
            .text("model", self.config.model.clone())
            .text("response_format", "json");

        if let Some(lang) = language {
            form = form.text("language", lang.code());
        }

        form
    }
}

#[async_trait]
impl SttBackend for GroqWhisperStt {
    async fn transcribe(
        &self,
        audio: &AudioUpload,
        language: Option<Language>,
    ) -> Result<String, SttError> {
        if audio.is_empty() {
            return Err(SttError::EmptyAudio);
        }

        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| SttError::Unauthenticated("GROQ_API_KEY is not set".to_string()))?;

        let form = self.build_form(audio, language);

        tracing::debug!(
            bytes = audio.bytes.len(),
            filename = %audio.filename,
            language = ?language.map(|l| l.code()),
            "Sending transcription request"
        );

        let response = self
            .client
            .post(self.transcription_url())
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                return Err(SttError::Unauthenticated(format!("HTTP {}", status)));
            }
            return Err(SttError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let result: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| SttError::InvalidResponse(e.to_string()))?;

        let text = result.text.trim();
        if text.is_empty() {
            return Err(SttError::EmptyTranscription);
        }

        Ok(text.to_string())
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
