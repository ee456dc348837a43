//! OpenAI-compatible Chat Completions client.
//!
//! Each round is one streaming `POST {base_url}/chat/completions`. Content
//! deltas go straight to the sink; tool-call deltas are accumulated by index
//! and, once the round's stream ends, executed through the registry. Their
//! results are appended to the conversation and the next round starts.

use super::sse::{DONE, SseDecoder};
use super::{ChatRequest, InferenceClient};
use crate::error::{DbError, DbResult};
use crate::tools::{ToolDescriptor, ToolRegistry, ToolResult};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("config", &self.config)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Send one streaming request and relay its content.
    async fn round(
        &self,
        api_key: &str,
        messages: &[JsonValue],
        tools: Option<&[JsonValue]>,
        sink: &mpsc::Sender<String>,
    ) -> DbResult<RoundOutcome> {
        let body = CompletionRequest {
            model: &self.config.model,
            messages,
            tools,
            stream: true,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DbError::inference(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            return Err(DbError::inference(format!(
                "Provider returned {}: {}",
                status.as_u16(),
                message
            )));
        }

        let mut outcome = RoundOutcome::default();
        let mut calls = ToolCallAccumulator::default();
        let mut decoder = SseDecoder::new();
        let mut stream = response.bytes_stream();

        'read: while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| DbError::inference(format!("Stream interrupted: {}", e)))?;
            for data in decoder.push(&chunk) {
                if data == DONE {
                    break 'read;
                }
                if !self.apply_event(&data, &mut outcome, &mut calls, sink).await? {
                    outcome.receiver_gone = true;
                    return Ok(outcome);
                }
            }
        }
        if let Some(data) = decoder.finish().filter(|d| d != DONE) {
            if !self.apply_event(&data, &mut outcome, &mut calls, sink).await? {
                outcome.receiver_gone = true;
                return Ok(outcome);
            }
        }

        outcome.tool_calls = calls.finish();
        Ok(outcome)
    }

    /// Apply one stream event. Returns `false` once the receiver is gone.
    async fn apply_event(
        &self,
        data: &str,
        outcome: &mut RoundOutcome,
        calls: &mut ToolCallAccumulator,
        sink: &mpsc::Sender<String>,
    ) -> DbResult<bool> {
        let chunk: StreamChunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, "Skipping unparseable stream event");
                return Ok(true);
            }
        };
        if let Some(error) = chunk.error {
            return Err(DbError::inference(error.message));
        }

        for choice in chunk.choices {
            if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                outcome.content.push_str(&text);
                if sink.send(text).await.is_err() {
                    return Ok(false);
                }
            }
            for delta in choice.delta.tool_calls.unwrap_or_default() {
                calls.apply(delta);
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl InferenceClient for OpenAiClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn stream_chat(
        &self,
        request: ChatRequest,
        registry: &ToolRegistry,
        sink: mpsc::Sender<String>,
    ) -> DbResult<()> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| DbError::configuration("OPENAI_API_KEY is not set"))?;

        let tool_defs: Vec<JsonValue> = registry.descriptors().iter().map(tool_definition).collect();

        let mut conversation = Vec::with_capacity(request.messages.len() + 1);
        conversation.push(json!({"role": "system", "content": request.system}));
        conversation.extend(
            request
                .messages
                .iter()
                .map(|m| json!({"role": m.role, "content": m.content})),
        );

        for step in 0..=request.max_tool_steps {
            let tools = (step < request.max_tool_steps).then_some(tool_defs.as_slice());
            let outcome = self.round(api_key, &conversation, tools, &sink).await?;

            if outcome.receiver_gone {
                debug!(step, "Chat receiver closed, stopping");
                return Ok(());
            }
            if outcome.tool_calls.is_empty() {
                info!(rounds = step + 1, "Chat completed");
                return Ok(());
            }
            if tools.is_none() {
                warn!("Model requested tools after the step limit; ignoring");
                return Ok(());
            }

            conversation.push(assistant_tool_message(&outcome.content, &outcome.tool_calls));
            for call in &outcome.tool_calls {
                let result = match call.parsed_arguments() {
                    Ok(params) => registry.invoke(&call.name, params).await,
                    Err(e) => ToolResult::failure(format!("Invalid tool arguments: {}", e)),
                };
                info!(tool = %call.name, step, error = result.is_error(), "Model tool call");
                conversation.push(json!({
                    "role": "tool",
                    "tool_call_id": call.id,
                    "content": result.to_json_string(),
                }));
            }
        }

        Ok(())
    }
}

/// Function-calling definition for one registry tool.
pub fn tool_definition(descriptor: &ToolDescriptor) -> JsonValue {
    json!({
        "type": "function",
        "function": {
            "name": descriptor.name,
            "description": descriptor.description,
            "parameters": descriptor.input_schema,
        }
    })
}

fn assistant_tool_message(content: &str, calls: &[ToolCall]) -> JsonValue {
    let content = if content.is_empty() {
        JsonValue::Null
    } else {
        JsonValue::String(content.to_string())
    };
    let tool_calls: Vec<JsonValue> = calls
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "type": "function",
                "function": {"name": c.name, "arguments": c.arguments},
            })
        })
        .collect();
    json!({"role": "assistant", "content": content, "tool_calls": tool_calls})
}

#[derive(Debug, Default)]
struct RoundOutcome {
    content: String,
    tool_calls: Vec<ToolCall>,
    receiver_gone: bool,
}

/// A complete tool call assembled from stream fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    /// Arguments as JSON; an empty string means no arguments.
    pub fn parsed_arguments(&self) -> Result<JsonValue, serde_json::Error> {
        if self.arguments.trim().is_empty() {
            return Ok(JsonValue::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&self.arguments)
    }
}

/// Collects streamed `tool_calls` deltas, keyed by their index.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<u32, ToolCall>,
}

impl ToolCallAccumulator {
    pub fn apply(&mut self, delta: ToolCallDelta) {
        let call = self.calls.entry(delta.index).or_default();
        if let Some(id) = delta.id.filter(|id| !id.is_empty()) {
            call.id = id;
        }
        if let Some(function) = delta.function {
            if let Some(name) = function.name {
                call.name.push_str(&name);
            }
            if let Some(arguments) = function.arguments {
                call.arguments.push_str(&arguments);
            }
        }
    }

    /// Calls in index order, dropping fragments that never got a name.
    pub fn finish(self) -> Vec<ToolCall> {
        self.calls
            .into_values()
            .filter(|c| !c.name.is_empty())
            .collect()
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [JsonValue],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [JsonValue]>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}
