//! Google Translate TTS backend
//!
//! The endpoint accepts at most 200 characters per request, so longer text is
//! split into chunks and the returned MP3 streams are concatenated. MP3 frames
//! are self-delimiting; the joined bytes play as one file.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use pragna_config::TtsSettings;
use pragna_core::Language;
use reqwest::Client;

use super::{SynthesizedAudio, TtsBackend, TtsError};

/// Longest text accepted in a single synthesis request (characters)
pub const MAX_CHUNK_CHARS: usize = 200;

const MIN_SPEED: f32 = 0.25;
const MAX_SPEED: f32 = 2.0;

/// Google TTS configuration
#[derive(Debug, Clone)]
pub struct GoogleTtsConfig {
    pub endpoint: String,
    /// Timeout for each chunk request
    pub timeout: Duration,
}

impl Default for GoogleTtsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://translate.google.com/translate_tts".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl From<&TtsSettings> for GoogleTtsConfig {
    fn from(settings: &TtsSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            timeout: settings.timeout(),
        }
    }
}

/// Speech synthesis through the Google Translate voice
pub struct GoogleTts {
    config: GoogleTtsConfig,
    client: Client,
}

impl GoogleTts {
    pub fn new(config: GoogleTtsConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TtsError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        idx: usize,
        total: usize,
        lang: &str,
        speed: f32,
    ) -> Result<Vec<u8>, TtsError> {
        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = chunk.chars().count().to_string();
        let speed = speed.to_string();

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("q", chunk),
                ("tl", lang),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
                ("ttsspeed", speed.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TtsError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl TtsBackend for GoogleTts {
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        speed: f32,
    ) -> Result<SynthesizedAudio, TtsError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(TtsError::EmptyText);
        }

        let lang = language.tts_code();
        if language == Language::Punjabi {
            tracing::debug!("No Punjabi voice available, using Hindi");
        }
        let speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        let start = Instant::now();

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let bytes = self
                .fetch_chunk(chunk, idx, chunks.len(), lang, speed)
                .await?;
            audio.extend_from_slice(&bytes);
        }

        tracing::debug!(
            lang,
            chunks = chunks.len(),
            bytes = audio.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Speech synthesized"
        );

        Ok(SynthesizedAudio::mpeg(audio))
    }
}

/// Characters after which a chunk prefers to end
const BREAK_AFTER: &[char] = &['.', '?', '!', ',', ';', ':', '।', '॥'];

/// Split `text` into pieces of at most `max_chars` characters.
///
/// A piece that has to be cut ends after the last word carrying punctuation
/// when it has one, otherwise at the last whitespace. A single word longer
/// than the limit is cut at character boundaries. Pieces are trimmed and never
/// empty.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    // Byte offset in `current` just after the last punctuated word
    let mut last_break: Option<usize> = None;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            last_break = None;
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        if !current.is_empty() && current_len + 1 + word_len > max_chars {
            let rest = match last_break.take() {
                Some(at) => current.split_off(at).trim_start().to_string(),
                None => String::new(),
            };
            chunks.push(std::mem::replace(&mut current, rest));
            current_len = current.chars().count();

            if !current.is_empty() && current_len + 1 + word_len > max_chars {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;

        if word.ends_with(BREAK_AFTER) {
            last_break = Some(current.len());
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
