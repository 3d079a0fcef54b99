//! Chat domain types.
//!
//! These types represent a chat session's conversation in the domain model,
//! independent of which backend generates the replies.

use serde::{Deserialize, Serialize};

/// System preamble every conversation starts with.
pub const SYSTEM_PREAMBLE: &str =
    "You are a helpful, friendly assistant. Respond concisely and clearly to the user's questions.";

/// Maximum number of entries kept in a conversation: the system preamble
/// plus ten user/assistant exchanges.
pub const MAX_HISTORY_ENTRIES: usize = 21;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Parse a role from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    /// Convert role to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single role-tagged message, in the shape both chat APIs accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Bounded conversation history for one chat session.
///
/// Index 0 always holds the system preamble. Once the history grows past
/// [`MAX_HISTORY_ENTRIES`], the oldest user/assistant pair (indices 1 and 2)
/// is evicted. Entries evicted by a user message that is later discarded are
/// put back.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
    /// Entries evicted by the latest unanswered user message
    evicted_by_pending: Vec<ChatMessage>,
}

impl ConversationHistory {
    /// Start a conversation with the default preamble.
    pub fn new() -> Self {
        Self::with_preamble(SYSTEM_PREAMBLE)
    }

    /// Start a conversation with a custom system preamble.
    pub fn with_preamble(preamble: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(preamble)],
            evicted_by_pending: Vec::new(),
        }
    }

    /// Append a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.evicted_by_pending = self.push(ChatMessage::user(content));
    }

    /// Append an assistant message.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
        self.evicted_by_pending.clear();
    }

    fn push(&mut self, message: ChatMessage) -> Vec<ChatMessage> {
        self.messages.push(message);
        self.enforce_bound()
    }

    /// Drop the most recent entry if it is an unanswered user message,
    /// restoring whatever its append evicted.
    ///
    /// Returns the removed message.
    pub fn discard_pending_user(&mut self) -> Option<ChatMessage> {
        if self.messages.len() > 1
            && self.messages.last().map(|m| m.role) == Some(MessageRole::User)
        {
            let removed = self.messages.pop();
            let restored = std::mem::take(&mut self.evicted_by_pending);
            self.messages.splice(1..1, restored);
            return removed;
        }
        None
    }

    /// Evict oldest exchanges until the bound holds. Returns what was evicted.
    fn enforce_bound(&mut self) -> Vec<ChatMessage> {
        let mut evicted = Vec::new();
        while self.messages.len() > MAX_HISTORY_ENTRIES {
            let end = self.messages.len().min(3);
            evicted.extend(self.messages.drain(1..end));
            tracing::debug!(
                remaining = self.messages.len(),
                "Evicted oldest exchange from conversation history"
            );
        }
        evicted
    }

    /// All messages, preamble first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The system preamble.
    pub fn preamble(&self) -> &ChatMessage {
        &self.messages[0]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when only the preamble is present.
    pub fn is_empty(&self) -> bool {
        self.messages.len() <= 1
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            assert_eq!(MessageRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(MessageRole::parse("tool"), None);
    }

    #[test]
    fn test_history_starts_with_preamble() {
        let history = ConversationHistory::new();
        assert_eq!(history.len(), 1);
        assert!(history.is_empty());
        assert_eq!(history.preamble().role, MessageRole::System);
        assert_eq!(history.preamble().content, SYSTEM_PREAMBLE);
    }

    #[test]
    fn test_history_bound_holds_over_many_turns() {
        let mut history = ConversationHistory::new();
        for turn in 0..50 {
            history.push_user(format!("question {turn}"));
            assert!(history.len() <= MAX_HISTORY_ENTRIES);
            history.push_assistant(format!("answer {turn}"));
            assert!(history.len() <= MAX_HISTORY_ENTRIES);
            assert_eq!(history.preamble().content, SYSTEM_PREAMBLE);
        }

        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        // Oldest retained exchange is turn 40
        assert_eq!(history.messages()[1].content, "question 40");
        assert_eq!(history.messages()[20].content, "answer 49");
    }

    #[test]
    fn test_discard_pending_user_only_removes_user_tail() {
        let mut history = ConversationHistory::new();
        assert!(history.discard_pending_user().is_none());

        history.push_user("hello");
        let removed = history.discard_pending_user().unwrap();
        assert_eq!(removed.content, "hello");
        assert_eq!(history.len(), 1);

        history.push_user("hello");
        history.push_assistant("hi");
        assert!(history.discard_pending_user().is_none());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_discarded_user_restores_evicted_exchange() {
        let mut history = ConversationHistory::new();
        for turn in 0..10 {
            history.push_user(format!("question {turn}"));
            history.push_assistant(format!("answer {turn}"));
        }
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        let before = history.messages().to_vec();

        history.push_user("question 10");
        assert!(history.len() <= MAX_HISTORY_ENTRIES);
        assert_eq!(history.messages()[1].content, "question 1");

        let removed = history.discard_pending_user().unwrap();
        assert_eq!(removed.content, "question 10");
        assert_eq!(history.messages(), before.as_slice());

        // A completed turn keeps its eviction
        history.push_user("question 10");
        history.push_assistant("answer 10");
        assert_eq!(history.messages()[1].content, "question 1");
        assert!(history.discard_pending_user().is_none());
        assert_eq!(history.messages()[1].content, "question 1");
    }

    #[test]
    fn test_chat_message_serializes_lowercase_role() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
