use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::llm::{
    models::{ChatOptions, ChatResponse, FunctionCall, Message, ToolCall, Usage},
    LlmError, LlmProvider,
};

/// Any endpoint speaking the OpenAI chat-completions dialect (OpenAI, DeepSeek, ...).
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: String, default_model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError> {
        let model = options.model.as_deref().unwrap_or(&self.default_model);
        let body = request_body(model, messages, &options);

        debug!(model, messages = messages.len(), "Sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(LlmError::RateLimited);
            }
            return Err(LlmError::Api(format!("OpenAI Error {}: {}", status, text)));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        parse_completion(&json, model)
    }
}

fn request_body(model: &str, messages: &[Message], options: &ChatOptions) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages,
    });

    if let Some(temperature) = options.temperature {
        body["temperature"] = json!(temperature);
    }
    if let Some(max_tokens) = options.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if let Some(tools) = options.tools.as_ref().filter(|t| !t.is_empty()) {
        body["tools"] = json!(tools);
    }

    body
}

fn parse_completion(json: &Value, requested_model: &str) -> Result<ChatResponse, LlmError> {
    let message = json["choices"]
        .get(0)
        .map(|choice| &choice["message"])
        .ok_or_else(|| LlmError::InvalidResponse("no choices in completion".to_string()))?;

    // Content is null when the model only requests tool calls.
    let content = message["content"].as_str().unwrap_or_default().to_string();

    let tool_calls = match message.get("tool_calls").and_then(Value::as_array) {
        Some(calls) => calls.iter().filter_map(parse_tool_call).collect(),
        None => Vec::new(),
    };

    let usage = json.get("usage").map(|u| Usage {
        input_tokens: u["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        output_tokens: u["completion_tokens"].as_u64().unwrap_or(0) as u32,
    });

    Ok(ChatResponse {
        content,
        model: json["model"].as_str().unwrap_or(requested_model).to_string(),
        usage,
        tool_calls,
    })
}

fn parse_tool_call(call: &Value) -> Option<ToolCall> {
    let function = &call["function"];
    let name = function["name"].as_str()?.to_string();
    // Some compatible servers send the arguments as an object rather than a string.
    let arguments = match &function["arguments"] {
        Value::String(s) => s.clone(),
        Value::Null => "{}".to_string(),
        other => other.to_string(),
    };
    let id = call["id"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));

    Some(ToolCall {
        id,
        r#type: "function".to_string(),
        function: FunctionCall { name, arguments },
    })
}
