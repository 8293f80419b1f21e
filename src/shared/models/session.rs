use super::message::ChatMessage;

pub const GREETING: &str = "Hi! Ask me for phone prices, specs, or images (India-focused).";

/// Conversation history for one interactive session.
///
/// Messages are kept in arrival order. Nothing is persisted; dropping the
/// session discards the conversation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn push_user(&mut self, content: &str) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: &str) {
        self.messages.push(ChatMessage::assistant(content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The most recent `limit` messages, oldest first.
    pub fn history_for_model(&self, limit: usize) -> Vec<ChatMessage> {
        let start = self.messages.len().saturating_sub(limit);
        self.messages[start..].to_vec()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.messages.push(ChatMessage::assistant(GREETING));
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::ChatRole;

    #[test]
    fn test_session_starts_with_greeting() {
        let session = ChatSession::new();
        assert_eq!(session.len(), 1);
        assert_eq!(session.messages()[0].role, ChatRole::Assistant);
        assert_eq!(session.messages()[0].content, GREETING);
    }

    #[test]
    fn test_history_keeps_most_recent_in_order() {
        let mut session = ChatSession::new();
        session.push_user("phones under 20000 rupees");
        session.push_assistant("Try the Redmi Note 13 5G.");
        session.push_user("show me images");

        let history = session.history_for_model(2);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "Try the Redmi Note 13 5G.");
        assert_eq!(history[1].content, "show me images");
        assert_eq!(session.history_for_model(50).len(), 4);
    }

    #[test]
    fn test_clear_resets_to_greeting() {
        let mut session = ChatSession::new();
        session.push_user("hello");
        session.clear();
        assert_eq!(session.len(), 1);
        assert_eq!(session.messages()[0].content, GREETING);
    }
}
