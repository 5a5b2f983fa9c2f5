//! LLM Provider Abstraction Layer
//!
//! This module provides a common interface for the model endpoints the coach
//! can talk to (Anthropic, or any OpenAI-compatible server such as Ollama or
//! vLLM). The `LLMProvider` trait defines the contract that all providers
//! must implement; providers receive the full ordered message history plus
//! the tool schema and return exactly one assistant turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod anthropic;
pub mod invoker;
pub mod openai;

pub use invoker::{ModelInvoker, RetryPolicy};

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl LLMError {
    /// Whether the failure is transient and worth retrying.
    ///
    /// Rate limits, network failures, timeouts, and server-side errors come
    /// and go; authentication and malformed-request failures do not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LLMError::RateLimitExceeded
                | LLMError::NetworkError(_)
                | LLMError::Timeout
                | LLMError::ProviderUnavailable(_)
        )
    }
}

/// Message in a conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (system, user, assistant, tool)
    pub role: MessageRole,

    /// Text content of the message (may be empty for assistant messages
    /// that only carry tool calls)
    pub content: String,

    /// Tool calls requested by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// For tool messages, the id of the call this message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a new assistant message with plain text only
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create an assistant message from a completed model turn
    pub fn assistant_turn(turn: &CompletionTurn) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: turn.content.clone(),
            tool_calls: turn.tool_calls.clone(),
            tool_call_id: None,
        }
    }

    /// Create a tool result message answering the given call id
    pub fn tool_result(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message
    System,

    /// User message
    User,

    /// Assistant message
    Assistant,

    /// Tool result message
    Tool,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// Tool call request from the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Arguments to pass to the tool (JSON string)
    pub arguments: String,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Schema of one callable tool, advertised to the model with each request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name the model uses to call the tool
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema of the argument payload
    pub parameters: serde_json::Value,
}

/// One assistant turn as returned by a provider
///
/// Carries the text content (possibly empty) and zero or more tool calls.
/// A turn with no tool calls is a final answer and ends the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionTurn {
    /// Generated text (may be empty when the turn only requests tools)
    pub content: String,

    /// Tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
}

impl CompletionTurn {
    /// A final text answer with no tool calls
    pub fn final_answer(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Whether this turn ends the conversation
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// LLM Provider trait that all providers must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "anthropic", "openai")
    fn name(&self) -> &str;

    /// Generate one assistant turn from the full conversation history
    ///
    /// # Arguments
    /// * `messages` - Ordered history: system prompt first, then user
    ///   messages, assistant turns, and tool results
    /// * `tools` - Schemas of the tools the model may call
    async fn generate(&self, messages: &[Message], tools: &[ToolDefinition])
        -> Result<CompletionTurn>;

    /// Check if the provider is currently usable (e.g., credentials present).
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Sampling settings shared by all providers
///
/// Low temperature keeps the model literal about the STRICTLY ENFORCE rules
/// in the coach prompt; the token bound caps plan length.
#[derive(Debug, Clone, Copy)]
pub struct Sampling {
    /// Maximum tokens the model may generate per turn
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.2,
        }
    }
}
