//! Chat relay
//!
//! Composes the orchestrator with transcription and speech synthesis for the
//! text, audio and speech-only request paths.

use std::sync::Arc;
use std::time::Instant;

use pragna_config::Settings;
use pragna_core::{detect_language, preview, Language};
use pragna_pipeline::{AudioUpload, SttBackend, SttError, SynthesizedAudio, TtsBackend, TtsError};
use thiserror::Error;

use crate::orchestrator::ResponseOrchestrator;

/// Relay errors
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Transcription failed: {0}")]
    Transcription(#[from] SttError),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(#[from] TtsError),
}

/// Reply to one text or audio request
#[derive(Debug, Clone)]
pub struct RelayReply {
    pub response_text: String,
    /// Language the reply was requested in
    pub language: Language,
    /// Spoken reply; `None` when synthesis is off or failed
    pub audio: Option<SynthesizedAudio>,
}

/// Relay options
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Attach synthesized audio to text and audio replies
    pub tts_enabled: bool,
    /// Speaking rate for attached audio
    pub default_speed: f32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            tts_enabled: true,
            default_speed: 1.0,
        }
    }
}

impl From<&Settings> for RelayConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            tts_enabled: settings.tts.enabled,
            default_speed: settings.tts.default_speed,
        }
    }
}

pub struct ChatRelay {
    orchestrator: ResponseOrchestrator,
    stt: Arc<dyn SttBackend>,
    tts: Arc<dyn TtsBackend>,
    config: RelayConfig,
}

impl ChatRelay {
    pub fn new(
        orchestrator: ResponseOrchestrator,
        stt: Arc<dyn SttBackend>,
        tts: Arc<dyn TtsBackend>,
        config: RelayConfig,
    ) -> Self {
        Self {
            orchestrator,
            stt,
            tts,
            config,
        }
    }

    pub fn orchestrator(&self) -> &ResponseOrchestrator {
        &self.orchestrator
    }

    /// Transcription model used for audio requests
    pub fn stt_model(&self) -> &str {
        self.stt.model_name()
    }

    /// Plain chat: reply text only
    pub async fn chat(&self, message: &str, language: Language, user_id: &str) -> String {
        self.orchestrator
            .get_response(message, language, user_id)
            .await
    }

    /// Text in, reply text plus best-effort audio out
    pub async fn process_text(&self, text: &str, language_code: &str, user_id: &str) -> RelayReply {
        let language = Language::normalize(language_code);
        let response_text = self
            .orchestrator
            .get_response(text, language, user_id)
            .await;
        let audio = self.attach_audio(&response_text, language).await;

        RelayReply {
            response_text,
            language,
            audio,
        }
    }

    /// Audio in: transcribe, detect the language, reply, attach audio.
    ///
    /// `hint` is passed to transcription only when it names a supported
    /// language; detection uses it the same way.
    pub async fn process_audio(
        &self,
        audio: &AudioUpload,
        hint: Option<&str>,
        user_id: &str,
    ) -> Result<RelayReply, RelayError> {
        let hint = hint.filter(|h| !h.trim().is_empty());
        let hint_language = hint.and_then(Language::from_code);

        let start = Instant::now();
        let transcript = self.stt.transcribe(audio, hint_language).await;
        metrics::histogram!("pragna_stt_latency_seconds").record(start.elapsed().as_secs_f64());
        let transcript = transcript.map_err(|e| {
            tracing::warn!(user_id, error = %e, "Transcription failed");
            e
        })?;

        let language = detect_language(&transcript, hint);
        tracing::info!(
            user_id,
            language = language.code(),
            preview = preview(&transcript, 50),
            "Transcribed audio"
        );

        let response_text = self
            .orchestrator
            .get_response(&transcript, language, user_id)
            .await;
        let audio = self.attach_audio(&response_text, language).await;

        Ok(RelayReply {
            response_text,
            language,
            audio,
        })
    }

    /// Speech only. Unlike the chat paths, failure is returned to the caller.
    pub async fn synthesize(
        &self,
        text: &str,
        language_code: &str,
        speed: Option<f32>,
    ) -> Result<SynthesizedAudio, RelayError> {
        let language = Language::normalize(language_code);
        let speed = speed.unwrap_or(self.config.default_speed);
        if language == Language::Punjabi {
            tracing::warn!("Punjabi speech not supported, using Hindi voice");
        }

        let start = Instant::now();
        let result = self.tts.synthesize(text, language, speed).await;
        metrics::histogram!("pragna_tts_latency_seconds").record(start.elapsed().as_secs_f64());

        Ok(result?)
    }

    pub fn clear_history(&self, user_id: &str) {
        self.orchestrator.clear_history(user_id);
    }

    async fn attach_audio(&self, text: &str, language: Language) -> Option<SynthesizedAudio> {
        if !self.config.tts_enabled {
            return None;
        }

        let start = Instant::now();
        let result = self
            .tts
            .synthesize(text, language, self.config.default_speed)
            .await;
        metrics::histogram!("pragna_tts_latency_seconds").record(start.elapsed().as_secs_f64());

        match result {
            Ok(audio) => Some(audio),
            Err(e) => {
                tracing::error!(error = %e, language = language.code(), "Speech synthesis failed");
                None
            }
        }
    }
}
