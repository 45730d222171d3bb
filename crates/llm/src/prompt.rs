//! Prompt Building
//!
//! Constructs the message sequence sent to the chat model: a language-aware
//! system instruction, the trailing conversation window, then the new user
//! message.

use pragna_core::Language;

pub use pragna_core::{ConversationEntry as Message, Role};

/// System instruction asking the model to answer in `language`
pub fn system_prompt(language: Language) -> String {
    let lang_name = language.name();
    format!(
        "You are a helpful, friendly AI assistant that can communicate in multiple languages.\n\
         The user is communicating in {lang_name}.\n\
         Please respond in {lang_name} to match the user's language.\n\
         Be concise, helpful, and natural in your responses.\n\
         If the user asks something you don't know, be honest about it.\n\
         For factual questions, provide accurate information."
    )
}

/// Builder for a chat completion message sequence
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    messages: Vec<Message>,
}

impl PromptBuilder {
    /// Start with the system instruction for `language`
    pub fn new(language: Language) -> Self {
        Self {
            messages: vec![Message::system(system_prompt(language))],
        }
    }

    /// Append prior conversation entries, oldest first
    pub fn with_history(mut self, history: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(history);
        self
    }

    /// Append the new user message
    pub fn with_user_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    pub fn build(self) -> Vec<Message> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_names_language() {
        let prompt = system_prompt(Language::Kannada);
        assert!(prompt.contains("The user is communicating in Kannada."));
        assert!(prompt.contains("Please respond in Kannada"));
        assert!(prompt.contains("be honest"));
    }

    #[test]
    fn test_builder_order() {
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let messages = PromptBuilder::new(Language::English)
            .with_history(history)
            .with_user_message("how are you?")
            .build();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role(), Role::System);
        assert_eq!(messages[1].content(), "hi");
        assert_eq!(messages[2].role(), Role::Assistant);
        assert_eq!(messages[3].role(), Role::User);
        assert_eq!(messages[3].content(), "how are you?");
    }
}
