//! OpenAI Chat Completions client
//!
//! Non-streaming only: the classifier, itinerary writer and question
//! answerer each need one complete reply per request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    CompletionRequest, CompletionResponse, ContentBlock, LlmClient, LlmError, Message, MessageContent, Role,
    StopReason, TokenUsage, ToolCall,
};
use crate::config::LlmConfig;

/// Attempts after the first for 408/5xx and network failures
const MAX_RETRIES: u32 = 3;

const INITIAL_BACKOFF_MS: u64 = 1000;

/// Used when a 429 carries no readable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

pub struct OpenAIClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    fn tool_result(call_id: &str, content: &str) -> Self {
        Self {
            tool_call_id: Some(call_id.to_string()),
            ..Self::text("tool", content)
        }
    }
}

impl OpenAIClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "OpenAIClient::from_config: called");
        let api_key = config.get_api_key().map_err(|e| LlmError::Config(e.to_string()))?;
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    fn chat_request<'a>(&'a self, request: &CompletionRequest) -> ChatRequest<'a> {
        let mut messages = vec![ChatMessage::text("system", request.system_prompt.clone())];
        messages.extend(request.messages.iter().flat_map(to_chat_messages));
        let tools: Vec<Value> = request.tools.iter().map(|t| t.to_openai_schema()).collect();

        ChatRequest {
            model: &self.model,
            messages,
            max_tokens: request.max_tokens.min(self.max_tokens),
            tool_choice: (!tools.is_empty()).then_some("auto"),
            tools,
        }
    }

    /// One HTTP round trip
    async fn send(&self, body: &ChatRequest<'_>) -> Result<CompletionResponse, LlmError> {
        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(body.into_completion())
    }
}

/// One internal message becomes one or more API messages
///
/// Each tool result is its own `tool` message; tool calls ride on an
/// assistant message.
fn to_chat_messages(message: &Message) -> Vec<ChatMessage> {
    let role = match message.role {
        Role::User => "user",
        Role::Assistant => "assistant",
    };
    let blocks = match &message.content {
        MessageContent::Text(text) => return vec![ChatMessage::text(role, text.clone())],
        MessageContent::Blocks(blocks) => blocks,
    };

    let results: Vec<ChatMessage> = blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::ToolResult {
                tool_use_id, content, ..
            } => Some(ChatMessage::tool_result(tool_use_id, content)),
            _ => None,
        })
        .collect();
    if !results.is_empty() {
        return results;
    }

    let text: String = blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    let tool_calls: Vec<Value> = blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::ToolUse { id, name, input } => Some(serde_json::json!({
                "id": id,
                "type": "function",
                "function": { "name": name, "arguments": input.to_string() },
            })),
            _ => None,
        })
        .collect();

    vec![ChatMessage {
        role,
        content: (!text.is_empty() || tool_calls.is_empty()).then_some(text),
        tool_calls,
        tool_call_id: None,
    }]
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %self.model, max_tokens = request.max_tokens, "OpenAIClient::complete: called");
        let body = self.chat_request(&request);

        let mut attempt = 0;
        loop {
            match self.send(&body).await {
                Err(e) if attempt < MAX_RETRIES && e.is_retryable() && !matches!(e, LlmError::RateLimited { .. }) => {
                    attempt += 1;
                    let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                    warn!(attempt, backoff_ms = backoff, error = %e, "Retrying completion after transient error");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                result => return result,
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ApiToolCall>,
}

#[derive(Debug, Deserialize)]
struct ApiToolCall {
    id: String,
    function: ApiFunction,
}

#[derive(Debug, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

impl ChatResponse {
    fn into_completion(self) -> CompletionResponse {
        let usage = self
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        let Some(choice) = self.choices.into_iter().next() else {
            return CompletionResponse {
                content: None,
                tool_calls: Vec::new(),
                stop_reason: StopReason::EndTurn,
                usage,
            };
        };

        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|call| {
                // Malformed arguments surface as a missing-argument tool error
                let input = serde_json::from_str(&call.function.arguments).unwrap_or_else(|e| {
                    warn!(tool = %call.function.name, error = %e, "Unparseable tool arguments");
                    Value::Object(Default::default())
                });
                ToolCall {
                    id: call.id,
                    name: call.function.name,
                    input,
                }
            })
            .collect();

        CompletionResponse {
            content: choice.message.content,
            tool_calls,
            stop_reason: StopReason::from_openai(choice.finish_reason.as_deref()),
            usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolDefinition;

    fn client(max_tokens: u32) -> OpenAIClient {
        OpenAIClient {
            model: "gpt-4o".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://api.openai.com".to_string(),
            http: Client::new(),
            max_tokens,
        }
    }

    fn body(client: &OpenAIClient, request: &CompletionRequest) -> Value {
        serde_json::to_value(client.chat_request(request)).unwrap()
    }

    #[test]
    fn test_request_body_basic() {
        let request = CompletionRequest {
            system_prompt: "You are TripMind".to_string(),
            messages: vec![Message::user("Hello")],
            tools: vec![],
            max_tokens: 1000,
        };

        let body = body(&client(8192), &request);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are TripMind");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_max_tokens_capped() {
        let request = CompletionRequest {
            system_prompt: "Test".to_string(),
            messages: vec![],
            tools: vec![ToolDefinition::new("list", "List", serde_json::json!({"type": "object"}))],
            max_tokens: 5000,
        };

        let body = body(&client(1000), &request);
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["function"]["name"], "list");
    }

    #[test]
    fn test_tool_round_trip_messages() {
        let call = ToolCall::new("call_1", "get_user_trips", serde_json::json!({}));
        let messages = [
            Message::user("show my trips"),
            Message::assistant_blocks(vec![ContentBlock::tool_use(&call)]),
            Message::user_blocks(vec![
                ContentBlock::tool_result("call_1", "[]", false),
                ContentBlock::tool_result("call_2", "{}", false),
            ]),
        ];

        let converted: Vec<Value> = messages
            .iter()
            .flat_map(to_chat_messages)
            .map(|m| serde_json::to_value(m).unwrap())
            .collect();
        assert_eq!(converted.len(), 4);
        assert_eq!(converted[1]["role"], "assistant");
        assert!(converted[1].get("content").is_none());
        assert_eq!(converted[1]["tool_calls"][0]["function"]["name"], "get_user_trips");
        assert_eq!(converted[2]["role"], "tool");
        assert_eq!(converted[2]["tool_call_id"], "call_1");
        assert_eq!(converted[3]["tool_call_id"], "call_2");
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let raw = serde_json::json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_a",
                        "type": "function",
                        "function": { "name": "plan_trip", "arguments": "{\"destination\":\"Kyoto\"}" }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
        });
        let response = serde_json::from_value::<ChatResponse>(raw).unwrap().into_completion();

        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].input["destination"], "Kyoto");
        assert_eq!(response.usage.input_tokens, 10);
    }

    #[test]
    fn test_bad_arguments_become_empty_object() {
        let raw = serde_json::json!({
            "choices": [{
                "message": {
                    "content": "hi",
                    "tool_calls": [{
                        "id": "call_b",
                        "function": { "name": "plan_trip", "arguments": "not json" }
                    }]
                },
                "finish_reason": "stop"
            }]
        });
        let response = serde_json::from_value::<ChatResponse>(raw).unwrap().into_completion();

        assert_eq!(response.content.as_deref(), Some("hi"));
        assert_eq!(response.tool_calls[0].input, serde_json::json!({}));
        assert_eq!(response.usage.output_tokens, 0);
    }

    #[test]
    fn test_no_choices() {
        let raw = serde_json::json!({ "choices": [] });
        let response = serde_json::from_value::<ChatResponse>(raw).unwrap().into_completion();
        assert!(response.content.is_none());
        assert!(response.tool_calls.is_empty());
    }
}
