//! Conversation memory for one run
//!
//! Holds the ordered message history for exactly one in-flight run, keyed by
//! a UUID generated at construction. A `Conversation` is created at the
//! start of a run, mutated only by appending, and dropped when the run
//! returns — no conversation state survives across runs, so nothing ever
//! needs resetting.

use crate::llm::{Message, MessageRole};
use uuid::Uuid;

/// Ordered, append-only message history for a single run.
///
/// The first message is always the system prompt and messages are never
/// reordered, deduplicated, or removed.
#[derive(Debug, Clone)]
pub struct Conversation {
    /// Unique identifier for this run
    id: Uuid,

    /// All messages, in causal order
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with the system prompt as its first message.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: vec![Message::system(system_prompt.into())],
        }
    }

    /// The run identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Append a message. Messages are immutable once appended.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages in causal order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The first user message, i.e. the composite request of this run.
    pub fn first_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }

    /// Content of the last assistant message that carries plain text.
    ///
    /// Assistant messages that only carried tool calls with no accompanying
    /// text are skipped.
    pub fn final_answer(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant && !m.content.trim().is_empty())
            .map(|m| m.content.as_str())
    }
}
