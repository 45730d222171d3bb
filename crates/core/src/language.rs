//! Language definitions for the ten supported languages
//!
//! English plus nine Indian languages. Each language maps to the script it is
//! written in; the scripts carry the Unicode block used by the detector.

use serde::{Deserialize, Serialize};

/// Supported languages (English + 9 Indian languages)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "kn")]
    Kannada,
    #[serde(rename = "te")]
    Telugu,
    #[serde(rename = "ta")]
    Tamil,
    #[serde(rename = "ml")]
    Malayalam,
    #[serde(rename = "mr")]
    Marathi,
    #[serde(rename = "bn")]
    Bengali,
    #[serde(rename = "gu")]
    Gujarati,
    #[serde(rename = "pa")]
    Punjabi,
}

impl Language {
    /// Get ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Kannada => "kn",
            Self::Telugu => "te",
            Self::Tamil => "ta",
            Self::Malayalam => "ml",
            Self::Marathi => "mr",
            Self::Bengali => "bn",
            Self::Gujarati => "gu",
            Self::Punjabi => "pa",
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Kannada => "Kannada",
            Self::Telugu => "Telugu",
            Self::Tamil => "Tamil",
            Self::Malayalam => "Malayalam",
            Self::Marathi => "Marathi",
            Self::Bengali => "Bengali",
            Self::Gujarati => "Gujarati",
            Self::Punjabi => "Punjabi",
        }
    }

    /// Get script used by this language
    pub fn script(&self) -> Script {
        match self {
            Self::English => Script::Latin,
            Self::Hindi | Self::Marathi => Script::Devanagari,
            Self::Kannada => Script::Kannada,
            Self::Telugu => Script::Telugu,
            Self::Tamil => Script::Tamil,
            Self::Malayalam => Script::Malayalam,
            Self::Bengali => Script::Bengali,
            Self::Gujarati => Script::Gujarati,
            Self::Punjabi => Script::Gurmukhi,
        }
    }

    /// Voice code for speech synthesis.
    ///
    /// The synthesis service has no Punjabi voice, so Punjabi is spoken with
    /// the Hindi one.
    pub fn tts_code(&self) -> &'static str {
        match self {
            Self::Punjabi => "hi",
            other => other.code(),
        }
    }

    /// Parse one of the ten supported codes. Only the exact lowercase code
    /// matches; `"HI"` or `" hi "` are not supported codes.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::all().iter().copied().find(|lang| lang.code() == code)
    }

    /// Parse a caller-supplied code, falling back to English for anything
    /// outside the supported set
    pub fn normalize(code: &str) -> Self {
        Self::from_code(code).unwrap_or_default()
    }

    /// Get all supported languages
    pub fn all() -> &'static [Language] {
        &[
            Self::English,
            Self::Hindi,
            Self::Kannada,
            Self::Telugu,
            Self::Tamil,
            Self::Malayalam,
            Self::Marathi,
            Self::Bengali,
            Self::Gujarati,
            Self::Punjabi,
        ]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Script systems used by the supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Script {
    Latin,
    Devanagari,
    Bengali,
    Gurmukhi,
    Gujarati,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
}

impl Script {
    /// Get Unicode range for this script (first block only)
    pub fn unicode_range(&self) -> (u32, u32) {
        match self {
            Self::Latin => (0x0000, 0x007F),
            Self::Devanagari => (0x0900, 0x097F),
            Self::Bengali => (0x0980, 0x09FF),
            Self::Gurmukhi => (0x0A00, 0x0A7F),
            Self::Gujarati => (0x0A80, 0x0AFF),
            Self::Tamil => (0x0B80, 0x0BFF),
            Self::Telugu => (0x0C00, 0x0C7F),
            Self::Kannada => (0x0C80, 0x0CFF),
            Self::Malayalam => (0x0D00, 0x0D7F),
        }
    }

    /// Check if a character belongs to this script
    pub fn contains(&self, c: char) -> bool {
        let (start, end) = self.unicode_range();
        (start..=end).contains(&(c as u32))
    }
}

/// Scripts considered by [`detect_language`], in tie-break priority order.
///
/// When two scripts have the same character count, the one listed first wins.
/// Devanagari is reported as Hindi; Marathi text is never told apart.
pub const DETECTION_PRIORITY: [(Script, Language); 8] = [
    (Script::Devanagari, Language::Hindi),
    (Script::Kannada, Language::Kannada),
    (Script::Telugu, Language::Telugu),
    (Script::Tamil, Language::Tamil),
    (Script::Malayalam, Language::Malayalam),
    (Script::Bengali, Language::Bengali),
    (Script::Gujarati, Language::Gujarati),
    (Script::Gurmukhi, Language::Punjabi),
];

/// Count characters per detection script, indexed like [`DETECTION_PRIORITY`]
pub fn script_counts(text: &str) -> [usize; 8] {
    let mut counts = [0usize; 8];
    for c in text.chars() {
        if let Some(idx) = DETECTION_PRIORITY
            .iter()
            .position(|(script, _)| script.contains(c))
        {
            counts[idx] += 1;
        }
    }
    counts
}

/// Work out the language of a piece of (transcribed) text.
///
/// A hint that names one of the supported languages always wins. Otherwise the
/// characters of each Indic script are counted and the script with the most
/// characters decides; ties go to the script listed first in
/// [`DETECTION_PRIORITY`]. Text without any Indic characters is English.
pub fn detect_language(text: &str, hint: Option<&str>) -> Language {
    if let Some(lang) = hint.and_then(Language::from_code) {
        return lang;
    }

    if text.is_empty() {
        return Language::English;
    }

    let counts = script_counts(text);
    let max = counts.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return Language::English;
    }

    counts
        .iter()
        .position(|&count| count == max)
        .map(|idx| DETECTION_PRIORITY[idx].1)
        .unwrap_or_default()
}
