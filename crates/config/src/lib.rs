//! Configuration management for the Pragna relay
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default.*`, `config/{env}.*`)
//! - Environment variables (`PRAGNA__` prefix, `__` separator)
//! - Plain service variables (`GROQ_API_KEY`,
//!   `GROQ_MODEL`, `GROQ_TIMEOUT`, `CONVERSATION_HISTORY_SIZE`, `LOG_LEVEL`, `PORT`)
//!   which act as defaults
//!
//! Settings are built once at startup and shared read-only.

pub mod settings;

pub use settings::{
    load_settings, HistoryConfig, LlmSettings, ObservabilityConfig, ServerConfig, Settings,
    SttSettings, TtsSettings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
