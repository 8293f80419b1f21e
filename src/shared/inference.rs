use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::config::Config;
use super::error::{AssistantError, Result};
use super::models::{ChatMessage, ChatRole, ToolCall};

const MAX_ATTEMPTS: usize = 3;

/// A chat model that can answer with text or tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion. `tools` holds OpenAI function definitions and may be empty.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
        tools: &[Value],
    ) -> Result<ModelResponse>;
}

/// Client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct InferenceClient {
    client: Client,
    base_url: String,
    auth_header: Option<String>,
    model: String,
}

#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub total_tokens: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<RawToolCall>>,
}

#[derive(Debug, Deserialize)]
struct RawToolCall {
    #[serde(default)]
    id: Option<String>,
    function: RawFunction,
}

#[derive(Debug, Deserialize)]
struct RawFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    total_tokens: Option<i64>,
}

impl InferenceClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AssistantError::Model(format!("Failed to create inference client: {}", e)))?;

        let auth_header = config
            .groq_api_key
            .as_ref()
            .map(|key| format!("Bearer {}", key.trim()));

        Ok(Self {
            client,
            base_url: config.llm_url.trim_end_matches('/').to_string(),
            auth_header,
            model: config.model.clone(),
        })
    }

    pub async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
        tools: &[Value],
    ) -> Result<ModelResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = build_request(&self.model, messages, system_prompt, tools);

        for attempt in 0..MAX_ATTEMPTS {
            debug!(attempt = attempt + 1, messages = messages.len(), "Sending completion request");

            let mut request_builder = self.client.post(&url).json(&request);
            if let Some(header) = &self.auth_header {
                request_builder = request_builder.header("Authorization", header);
            }

            let resp = request_builder.send().await.map_err(AssistantError::Request)?;

            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "<failed to read response>".to_string());

                if is_retryable(status) && attempt + 1 < MAX_ATTEMPTS {
                    warn_retry(status, &text, attempt);
                    tokio::time::sleep(std::time::Duration::from_millis(500 * (attempt as u64 + 1)))
                        .await;
                    continue;
                }

                return Err(AssistantError::Model(format!(
                    "Inference service error ({}): {}",
                    status, text
                )));
            }

            let response_text = resp
                .text()
                .await
                .map_err(|e| AssistantError::Model(format!("Failed to read response text: {}", e)))?;

            return parse_response(&response_text);
        }

        Err(AssistantError::Model(
            "Inference request failed after retries".to_string(),
        ))
    }
}

#[async_trait]
impl ChatModel for InferenceClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
        tools: &[Value],
    ) -> Result<ModelResponse> {
        self.chat_completion(messages, system_prompt, tools).await
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn warn_retry(status: StatusCode, body: &str, attempt: usize) {
    warn!(
        "Retrying inference call due to error (attempt {}/{}) status={} body={}",
        attempt + 1,
        MAX_ATTEMPTS,
        status,
        body
    );
}

/// Build the chat-completions request body.
pub fn build_request(
    model: &str,
    messages: &[ChatMessage],
    system_prompt: Option<&str>,
    tools: &[Value],
) -> Value {
    let mut wire: Vec<Value> = Vec::with_capacity(messages.len() + 1);
    if let Some(sp) = system_prompt {
        wire.push(json!({"role": "system", "content": sp}));
    }

    for message in messages {
        match message.role {
            ChatRole::Tool => wire.push(json!({
                "role": "tool",
                "tool_call_id": message.tool_call_id.clone().unwrap_or_default(),
                "content": message.content,
            })),
            ChatRole::Assistant if message.tool_calls.is_some() => {
                let calls: Vec<Value> = message
                    .tool_calls
                    .iter()
                    .flatten()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments.to_string(),
                            }
                        })
                    })
                    .collect();
                let content = if message.content.is_empty() {
                    Value::Null
                } else {
                    Value::String(message.content.clone())
                };
                wire.push(json!({"role": "assistant", "content": content, "tool_calls": calls}));
            }
            role => {
                if message.content.trim().is_empty() {
                    continue;
                }
                wire.push(json!({"role": role.as_str(), "content": message.content.trim()}));
            }
        }
    }

    let mut request = json!({
        "model": model,
        "messages": wire,
        "stream": false,
    });
    if !tools.is_empty() {
        request["tools"] = Value::Array(tools.to_vec());
        request["tool_choice"] = json!("auto");
    }
    request
}

/// Parse a chat-completions response body.
pub fn parse_response(response_text: &str) -> Result<ModelResponse> {
    let parsed: ChatResponse = serde_json::from_str(response_text)
        .map_err(|e| AssistantError::Model(format!("Failed to parse inference response: {}", e)))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AssistantError::Model("Inference response had no choices".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|raw| ToolCall {
            id: raw
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple())),
            name: raw.function.name,
            arguments: decode_arguments(raw.function.arguments),
        })
        .collect();

    Ok(ModelResponse {
        content: choice.message.content.filter(|c| !c.trim().is_empty()),
        tool_calls,
        total_tokens: parsed.usage.and_then(|u| u.total_tokens),
    })
}

/// Arguments arrive as a JSON-encoded string; undecodable text is kept as a
/// plain string so parameter mappers can still use it.
fn decode_arguments(arguments: Value) -> Value {
    match arguments {
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(value) => value,
            Err(_) => Value::String(raw),
        },
        Value::Null => json!({}),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_includes_system_tools_and_tool_turns() {
        let messages = vec![
            ChatMessage::user("price of Pixel 8a"),
            ChatMessage::assistant_tool_calls(vec![ToolCall {
                id: "call_1".to_string(),
                name: "SerpSearch".to_string(),
                arguments: json!({"query": "Pixel 8a"}),
            }]),
            ChatMessage::tool_result("call_1", "Pixel 8a costs ₹39,999"),
            ChatMessage::assistant("   "),
        ];
        let tools = vec![json!({"type": "function", "function": {"name": "SerpSearch"}})];

        let request = build_request("gemma2-9b-it", &messages, Some("be brief"), &tools);

        let wire = request["messages"].as_array().unwrap();
        assert_eq!(wire.len(), 4);
        assert_eq!(wire[0]["role"], "system");
        assert_eq!(wire[2]["content"], Value::Null);
        assert_eq!(
            wire[2]["tool_calls"][0]["function"]["arguments"],
            r#"{"query":"Pixel 8a"}"#
        );
        assert_eq!(wire[3]["tool_call_id"], "call_1");
        assert_eq!(request["tool_choice"], "auto");
        assert_eq!(request["stream"], false);
    }

    #[test]
    fn test_build_request_without_tools_omits_tool_fields() {
        let request = build_request("m", &[ChatMessage::user("hi")], None, &[]);
        assert!(request.get("tools").is_none());
        assert!(request.get("tool_choice").is_none());
    }

    #[test]
    fn test_parse_content_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello"}}],"usage":{"total_tokens":42}}"#;
        let response = parse_response(body).unwrap();
        assert_eq!(response.content.as_deref(), Some("Hello"));
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.total_tokens, Some(42));
    }

    #[test]
    fn test_parse_tool_call_response() {
        let body = r#"{"choices":[{"message":{"content":null,"tool_calls":[
            {"id":"call_a","type":"function","function":{"name":"WikiSpecs","arguments":"{\"query\":\"iPhone 13\"}"}},
            {"type":"function","function":{"name":"search","arguments":"iPhone 13 price"}}
        ]}}]}"#;
        let response = parse_response(body).unwrap();
        assert!(response.content.is_none());
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].arguments, json!({"query": "iPhone 13"}));
        assert_eq!(response.tool_calls[1].arguments, json!("iPhone 13 price"));
        assert!(response.tool_calls[1].id.starts_with("call_"));
    }

    #[test]
    fn test_parse_rejects_missing_choices() {
        assert!(parse_response(r#"{"choices":[]}"#).is_err());
        assert!(parse_response("not json").is_err());
    }
}
