//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat completion service
    #[serde(default)]
    pub llm: LlmSettings,

    /// Speech-to-text service
    #[serde(default)]
    pub stt: SttSettings,

    /// Text-to-speech service
    #[serde(default)]
    pub tts: TtsSettings,

    /// Conversation history retention
    #[serde(default)]
    pub history: HistoryConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS restrictions (false = permissive)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Directory holding the built frontend (served at `/`)
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Maximum request body size, covers audio uploads
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000)
}

fn default_true() -> bool {
    true
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            static_dir: default_static_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Chat completion service (Groq, OpenAI-compatible)
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// API key; without it the relay answers with the not-configured reply
    #[serde(default = "default_groq_api_key")]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Model identifier
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_groq_timeout")]
    pub timeout_seconds: u64,
}

// Keeps the API key out of logs.
impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

fn default_groq_api_key() -> Option<String> {
    std::env::var("GROQ_API_KEY")
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

fn default_llm_endpoint() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_model() -> String {
    std::env::var("GROQ_MODEL").unwrap_or_else(|_| "llama-3.1-8b-instant".to_string())
}

fn default_groq_timeout() -> u64 {
    std::env::var("GROQ_TIMEOUT")
        .ok()
        .and_then(|t| t.parse().ok())
        .unwrap_or(60)
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: default_groq_api_key(),
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            timeout_seconds: default_groq_timeout(),
        }
    }
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Speech-to-text service (Groq Whisper). Shares the LLM API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttSettings {
    /// OpenAI-compatible base URL
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Whisper model identifier
    #[serde(default = "default_stt_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_groq_timeout")]
    pub timeout_seconds: u64,
}

fn default_stt_model() -> String {
    "whisper-large-v3".to_string()
}

impl Default for SttSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_stt_model(),
            timeout_seconds: default_groq_timeout(),
        }
    }
}

impl SttSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Text-to-speech service (Google Translate TTS)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsSettings {
    /// Attach synthesized audio to chat replies
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Synthesis endpoint
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,

    /// Per-chunk request timeout in seconds
    #[serde(default = "default_tts_timeout")]
    pub timeout_seconds: u64,

    /// Speaking rate used when the caller gives none
    #[serde(default = "default_speed")]
    pub default_speed: f32,
}

fn default_tts_endpoint() -> String {
    "https://translate.google.com/translate_tts".to_string()
}

fn default_tts_timeout() -> u64 {
    5
}

fn default_speed() -> f32 {
    1.0
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_tts_endpoint(),
            timeout_seconds: default_tts_timeout(),
            default_speed: default_speed(),
        }
    }
}

impl TtsSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Conversation history retention
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Exchanges kept per user; the log holds at most twice this many entries
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Trailing entries sent to the model with each message
    #[serde(default = "default_context_messages")]
    pub context_messages: usize,
}

fn default_max_history() -> usize {
    std::env::var("CONVERSATION_HISTORY_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(100)
}

fn default_context_messages() -> usize {
    10
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            context_messages: default_context_messages(),
        }
    }
}

impl HistoryConfig {
    /// Upper bound on entries per user log
    pub fn max_entries(&self) -> usize {
        self.max_history.saturating_mul(2)
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Expose Prometheus metrics at /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    std::env::var("LOG_LEVEL")
        .map(|l| l.to_lowercase())
        .unwrap_or_else(|_| "info".to_string())
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a chat completion key is configured
    pub fn has_llm_credentials(&self) -> bool {
        self.llm
            .api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_services()?;
        self.validate_history()?;

        if !self.has_llm_credentials() {
            tracing::warn!("llm.api_key not set (GROQ_API_KEY) - chat and transcription will not work");
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "Port cannot be 0"));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(invalid("server.max_upload_bytes", "Must be at least 1 byte"));
        }

        Ok(())
    }

    fn validate_services(&self) -> Result<(), ConfigError> {
        let endpoints = [
            ("llm.endpoint", &self.llm.endpoint),
            ("stt.endpoint", &self.stt.endpoint),
            ("tts.endpoint", &self.tts.endpoint),
        ];
        for (field, endpoint) in endpoints {
            if endpoint.trim().is_empty() {
                return Err(invalid(field, "Endpoint cannot be empty"));
            }
        }

        let timeouts = [
            ("llm.timeout_seconds", self.llm.timeout_seconds),
            ("stt.timeout_seconds", self.stt.timeout_seconds),
            ("tts.timeout_seconds", self.tts.timeout_seconds),
        ];
        for (field, timeout) in timeouts {
            if timeout == 0 {
                return Err(invalid(field, "Timeout must be at least 1 second"));
            }
        }

        if self.llm.model.trim().is_empty() {
            return Err(invalid("llm.model", "Model cannot be empty"));
        }

        if !(0.25..=2.0).contains(&self.tts.default_speed) {
            return Err(invalid(
                "tts.default_speed",
                format!("Must be between 0.25 and 2.0, got {}", self.tts.default_speed),
            ));
        }

        Ok(())
    }

    fn validate_history(&self) -> Result<(), ConfigError> {
        if self.history.max_history == 0 {
            return Err(invalid("history.max_history", "Must keep at least 1 exchange"));
        }

        if self.history.context_messages == 0 {
            return Err(invalid("history.context_messages", "Must be at least 1"));
        }

        if self.history.context_messages > self.history.max_entries() {
            tracing::warn!(
                context_messages = self.history.context_messages,
                max_entries = self.history.max_entries(),
                "history.context_messages exceeds retained entries; context will be limited by retention"
            );
        }

        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Load settings from files and environment.
///
/// Priority: `PRAGNA__*` env vars > `config/{env}` > `config/default` > defaults.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("PRAGNA")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
