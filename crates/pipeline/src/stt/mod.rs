//! Speech-to-Text
//!
//! The relay never decodes audio itself: uploads are forwarded as-is to a
//! hosted transcription service.

mod groq;

pub use groq::{GroqWhisperConfig, GroqWhisperStt};

use async_trait::async_trait;
use pragna_core::Language;
use thiserror::Error;

/// STT errors
#[derive(Error, Debug)]
pub enum SttError {
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Empty audio upload")]
    EmptyAudio,

    #[error("Transcription was empty")]
    EmptyTranscription,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for SttError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SttError::Timeout
        } else if err.is_decode() {
            SttError::InvalidResponse(err.to_string())
        } else {
            SttError::Network(err.to_string())
        }
    }
}

/// An uploaded audio file, forwarded untouched to the transcription service
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

impl AudioUpload {
    pub const DEFAULT_FILENAME: &'static str = "audio.webm";
    pub const DEFAULT_CONTENT_TYPE: &'static str = "audio/webm";

    /// Upload with the browser recorder defaults (`audio.webm`, `audio/webm`)
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: Self::DEFAULT_FILENAME.to_string(),
            content_type: Self::DEFAULT_CONTENT_TYPE.to_string(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// STT backend trait
#[async_trait]
pub trait SttBackend: Send + Sync {
    /// Transcribe an upload. `language` narrows recognition when known.
    async fn transcribe(
        &self,
        audio: &AudioUpload,
        language: Option<Language>,
    ) -> Result<String, SttError>;

    /// Model name
    fn model_name(&self) -> &str;
}
