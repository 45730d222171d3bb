//! Conversation layer of the relay
//!
//! Features:
//! - Per-user conversation history with bounded retention
//! - Response orchestration with fixed fallback replies
//! - Chat relay tying chat, transcription and speech synthesis together

pub mod history;
pub mod orchestrator;
pub mod relay;

pub use history::ConversationStore;
pub use orchestrator::{
    fallback_reply, OrchestratorConfig, ResponseOrchestrator, ERROR_REPLY, NOT_CONFIGURED_REPLY,
    TIMEOUT_REPLY,
};
pub use relay::{ChatRelay, RelayConfig, RelayError, RelayReply};
