//! Speech collaborators
//!
//! Features:
//! - Transcription through a hosted Whisper-compatible endpoint
//! - Speech synthesis through Google Translate TTS
//!
//! Both sit behind async traits so the relay can be driven by mocks in tests.

pub mod stt;
pub mod tts;

pub use stt::{AudioUpload, GroqWhisperConfig, GroqWhisperStt, SttBackend, SttError};
pub use tts::{chunk_text, GoogleTts, GoogleTtsConfig, SynthesizedAudio, TtsBackend, TtsError};
