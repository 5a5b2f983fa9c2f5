//! Anthropic Messages API provider
//!
//! Speaks the native Messages API including tool use: tool schemas go out in
//! the `tools` array, assistant turns come back as content blocks (`text`
//! and `tool_use`), and tool results are replayed as `tool_result` blocks.
//! The API key is read from `ANTHROPIC_API_KEY` at call time.

use super::{CompletionTurn, LLMError, LLMProvider, Message, MessageRole, Sampling, ToolCall, ToolDefinition};
use crate::config::AnthropicConfig;
use async_trait::async_trait;
use serde_json::{json, Value};

const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

pub struct AnthropicProvider {
    config: AnthropicConfig,
    sampling: Sampling,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig, sampling: Sampling) -> Self {
        Self {
            config,
            sampling,
            client: reqwest::Client::new(),
        }
    }

    /// Convert the conversation history into the API's message shape.
    ///
    /// System messages are lifted out into the top-level `system` field.
    /// Consecutive tool results are folded into a single user turn because
    /// the API requires alternating user/assistant roles.
    fn build_messages(messages: &[Message]) -> (String, Vec<Value>) {
        let mut system_prompt = String::new();
        let mut api_messages: Vec<Value> = Vec::new();

        for msg in messages {
            match msg.role {
                MessageRole::System => {
                    system_prompt.push_str(&msg.content);
                    system_prompt.push('\n');
                }
                MessageRole::User => {
                    api_messages.push(json!({
                        "role": "user",
                        "content": msg.content,
                    }));
                }
                MessageRole::Assistant => {
                    let mut blocks: Vec<Value> = Vec::new();
                    if !msg.content.is_empty() {
                        blocks.push(json!({"type": "text", "text": msg.content}));
                    }
                    for call in &msg.tool_calls {
                        let input: Value = serde_json::from_str(&call.arguments)
                            .unwrap_or_else(|_| json!({}));
                        blocks.push(json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.name,
                            "input": input,
                        }));
                    }
                    api_messages.push(json!({"role": "assistant", "content": blocks}));
                }
                MessageRole::Tool => {
                    let block = json!({
                        "type": "tool_result",
                        "tool_use_id": msg.tool_call_id.clone().unwrap_or_default(),
                        "content": msg.content,
                    });

                    let folded = match api_messages.last_mut() {
                        Some(last) if Self::is_tool_result_turn(last) => {
                            if let Some(content) = last
                                .get_mut("content")
                                .and_then(|c| c.as_array_mut())
                            {
                                content.push(block.clone());
                                true
                            } else {
                                false
                            }
                        }
                        _ => false,
                    };

                    if !folded {
                        api_messages.push(json!({"role": "user", "content": [block]}));
                    }
                }
            }
        }

        (system_prompt, api_messages)
    }

    fn is_tool_result_turn(message: &Value) -> bool {
        message.get("role").and_then(Value::as_str) == Some("user")
            && message
                .get("content")
                .and_then(Value::as_array)
                .and_then(|blocks| blocks.first())
                .and_then(|b| b.get("type"))
                .and_then(Value::as_str)
                == Some("tool_result")
    }

    fn build_tools(tools: &[ToolDefinition]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": t.parameters,
                })
            })
            .collect()
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn check_health(&self) -> bool {
        std::env::var(API_KEY_ENV).is_ok()
    }

    async fn generate(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> super::Result<CompletionTurn> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| LLMError::AuthenticationFailed(format!("{API_KEY_ENV} is not set")))?;

        let url = format!("{}/messages", self.config.base_url);
        let (system_prompt, api_messages) = Self::build_messages(messages);

        let mut payload = json!({
            "model": self.config.model,
            "max_tokens": self.sampling.max_tokens,
            "temperature": self.sampling.temperature,
            "system": system_prompt,
            "messages": api_messages,
        });
        if !tools.is_empty() {
            payload["tools"] = Value::Array(Self::build_tools(tools));
        }

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| LLMError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed(text),
                429 => LLMError::RateLimitExceeded,
                500..=599 => LLMError::ProviderUnavailable(format!("HTTP {status}: {text}")),
                _ => LLMError::InvalidRequest(text),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let content_arr = data
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| LLMError::ParseError("No content array in response".to_string()))?;

        let mut full_content = String::new();
        let mut tool_calls = Vec::new();
        for item in content_arr {
            match item.get("type").and_then(Value::as_str) {
                Some("text") => {
                    if let Some(text) = item.get("text").and_then(Value::as_str) {
                        full_content.push_str(text);
                    }
                }
                Some("tool_use") => {
                    let id = item
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    let name = item
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    let input = item.get("input").cloned().unwrap_or_else(|| json!({}));
                    tool_calls.push(ToolCall::new(id, name, input.to_string()));
                }
                _ => {}
            }
        }

        Ok(CompletionTurn {
            content: full_content,
            tool_calls,
        })
    }
}
