//! Core types for the Pragna relay
//!
//! Foundational types shared by every other crate:
//! - Language definitions (English + 9 Indian languages)
//! - Script-based language detection
//! - Conversation entries
//! - Log-safe text previews

pub mod conversation;
pub mod language;
pub mod text;

pub use conversation::{ConversationEntry, Role};
pub use language::{detect_language, script_counts, Language, Script, DETECTION_PRIORITY};
pub use text::preview;
