//! Chat turns and conversation history.
//!
//! A `ChatTurn` is both the semantic message and its wire form: the provider
//! takes `{"role": ..., "content": ...}` objects, so the type serializes
//! directly into the request body.

use serde::{Deserialize, Serialize};

/// Role of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    role: ChatRole,
    content: String,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// History of a chat session.
///
/// Only completed exchanges are recorded: the user turn and the assistant
/// reply are pushed together once the reply has finished streaming.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ChatTurn>,
    /// Maximum number of turns kept, counted in user/assistant pairs
    max_exchanges: Option<usize>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `exchanges` user/assistant pairs
    pub fn with_max_exchanges(mut self, exchanges: usize) -> Self {
        self.max_exchanges = Some(exchanges);
        self.trim();
        self
    }

    /// Record a finished exchange
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(ChatTurn::user(user));
        self.turns.push(ChatTurn::assistant(assistant));
        self.trim();
    }

    /// Turns to send as history on the next request
    pub fn history(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    fn trim(&mut self) {
        if let Some(max) = self.max_exchanges {
            let keep = max * 2;
            if self.turns.len() > keep {
                let excess = self.turns.len() - keep;
                self.turns.drain(..excess);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_serializes_to_wire_shape() {
        let json = serde_json::to_value(ChatTurn::assistant("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
    }

    #[test]
    fn test_history_deserializes_from_wire_shape() {
        let history: Vec<ChatTurn> = serde_json::from_str(
            r#"[{"role":"user","content":"q1"},{"role":"assistant","content":"a1"}]"#,
        )
        .unwrap();
        assert_eq!(history, vec![ChatTurn::user("q1"), ChatTurn::assistant("a1")]);
    }

    #[test]
    fn test_conversation_keeps_order() {
        let mut conversation = Conversation::new();
        conversation.push_exchange("q1", "a1");
        conversation.push_exchange("q2", "a2");

        let contents: Vec<&str> = conversation.history().iter().map(|t| t.content()).collect();
        assert_eq!(contents, vec!["q1", "a1", "q2", "a2"]);
        assert_eq!(conversation.history()[0].role(), ChatRole::User);
        assert_eq!(conversation.history()[1].role(), ChatRole::Assistant);
    }

    #[test]
    fn test_conversation_drops_oldest_exchanges() {
        let mut conversation = Conversation::new().with_max_exchanges(2);
        conversation.push_exchange("q1", "a1");
        conversation.push_exchange("q2", "a2");
        conversation.push_exchange("q3", "a3");

        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation.history()[0], ChatTurn::user("q2"));
        assert_eq!(conversation.history()[3], ChatTurn::assistant("a3"));
    }
}
