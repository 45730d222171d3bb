//! Text-to-Speech
//!
//! Synthesized audio is returned whole (not streamed); callers embed it in
//! JSON responses as base64.

mod google;

pub use google::{chunk_text, GoogleTts, GoogleTtsConfig};

use async_trait::async_trait;
use base64::Engine;
use pragna_core::Language;
use thiserror::Error;

/// TTS errors
#[derive(Error, Debug)]
pub enum TtsError {
    #[error("Nothing to synthesize")]
    EmptyText,

    #[error("Timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for TtsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TtsError::Timeout
        } else {
            TtsError::Network(err.to_string())
        }
    }
}

/// Encoded audio with its MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl SynthesizedAudio {
    pub const MPEG: &'static str = "audio/mpeg";

    pub fn mpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime: Self::MPEG.to_string(),
        }
    }

    /// Standard base64 (with padding), as embedded in API responses
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// TTS backend trait
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Synthesize `text` in `language` at the given speaking rate (1.0 = normal)
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        speed: f32,
    ) -> Result<SynthesizedAudio, TtsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64() {
        let audio = SynthesizedAudio::mpeg(b"ID3".to_vec());
        assert_eq!(audio.to_base64(), "SUQz");
        assert_eq!(audio.mime, "audio/mpeg");
    }

    #[test]
    fn test_error_display() {
        let err = TtsError::Api {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "API error (HTTP 503): unavailable");
    }
}
