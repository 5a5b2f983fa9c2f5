//! OpenAI-compatible chat completions provider
//!
//! Works against any server implementing the `/chat/completions` shape:
//! OpenAI itself, or local runtimes like Ollama and vLLM via `base_url`.
//! Tool schemas go out as `function` tools; tool results are replayed with
//! `role: "tool"`. `OPENAI_API_KEY` is optional so local servers work
//! without credentials.

use super::{CompletionTurn, LLMError, LLMProvider, Message, MessageRole, Sampling, ToolCall, ToolDefinition};
use crate::config::OpenAIConfig;
use async_trait::async_trait;
use serde_json::{json, Value};

const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub struct OpenAIProvider {
    config: OpenAIConfig,
    sampling: Sampling,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig, sampling: Sampling) -> Self {
        Self {
            config,
            sampling,
            client: reqwest::Client::new(),
        }
    }

    fn build_messages(messages: &[Message]) -> Vec<Value> {
        let mut api_messages = Vec::new();
        for msg in messages {
            match msg.role {
                MessageRole::System | MessageRole::User => {
                    api_messages.push(json!({
                        "role": msg.role.to_string(),
                        "content": msg.content,
                    }));
                }
                MessageRole::Assistant => {
                    let mut entry = json!({
                        "role": "assistant",
                        "content": msg.content,
                    });
                    if !msg.tool_calls.is_empty() {
                        let calls: Vec<Value> = msg
                            .tool_calls
                            .iter()
                            .map(|call| {
                                json!({
                                    "id": call.id,
                                    "type": "function",
                                    "function": {
                                        "name": call.name,
                                        "arguments": call.arguments,
                                    },
                                })
                            })
                            .collect();
                        entry["tool_calls"] = Value::Array(calls);
                    }
                    api_messages.push(entry);
                }
                MessageRole::Tool => {
                    api_messages.push(json!({
                        "role": "tool",
                        "tool_call_id": msg.tool_call_id.clone().unwrap_or_default(),
                        "content": msg.content,
                    }));
                }
            }
        }
        api_messages
    }

    fn build_tools(tools: &[ToolDefinition]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    },
                })
            })
            .collect()
    }

    fn parse_tool_calls(message: &Value) -> Vec<ToolCall> {
        let Some(calls) = message.get("tool_calls").and_then(Value::as_array) else {
            return Vec::new();
        };

        calls
            .iter()
            .filter_map(|call| {
                let id = call.get("id").and_then(Value::as_str)?;
                let function = call.get("function")?;
                let name = function.get("name").and_then(Value::as_str)?;
                let arguments = function
                    .get("arguments")
                    .and_then(Value::as_str)
                    .unwrap_or("{}");
                Some(ToolCall::new(id, name, arguments))
            })
            .collect()
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> super::Result<CompletionTurn> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let mut payload = json!({
            "model": self.config.model,
            "temperature": self.sampling.temperature,
            "max_tokens": self.sampling.max_tokens,
            "messages": Self::build_messages(messages),
        });
        if !tools.is_empty() {
            payload["tools"] = Value::Array(Self::build_tools(tools));
        }

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload);

        // Local servers (Ollama, vLLM) accept unauthenticated requests
        if let Ok(api_key) = std::env::var(API_KEY_ENV) {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
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

        let message = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|choice| choice.get("message"))
            .ok_or_else(|| LLMError::ParseError("No message in response".to_string()))?;

        let content = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let tool_calls = Self::parse_tool_calls(message);

        if content.is_empty() && tool_calls.is_empty() {
            return Err(LLMError::ParseError("Empty completion".to_string()));
        }

        Ok(CompletionTurn {
            content,
            tool_calls,
        })
    }
}
