//! Model inference for the chat endpoint.
//!
//! [`InferenceClient`] owns the whole tool-calling conversation: it streams
//! answer text into a channel and runs tool calls through the registry
//! between rounds. The HTTP layer only supplies history and relays text.

mod openai;
mod prompt;
pub mod sse;

pub use openai::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiClient, OpenAiConfig, ToolCall, ToolCallAccumulator,
    ToolCallDelta, tool_definition,
};
pub use prompt::SYSTEM_PROMPT;

use crate::error::DbResult;
use crate::tools::ToolRegistry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Default cap on tool-calling rounds per chat request.
pub const DEFAULT_MAX_TOOL_STEPS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One conversational request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    /// Rounds that may still end in tool calls; the round after the cap is
    /// sent without tools.
    pub max_tool_steps: usize,
}

/// A model provider that streams answer text.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Model identifier reported by the metadata endpoint.
    fn model(&self) -> &str;

    /// Whether a credential is present. Requests fail fast when it is not.
    fn is_configured(&self) -> bool;

    /// Run the conversation, sending text chunks to `sink` as they arrive.
    ///
    /// Returns once the model finishes or the receiver is dropped. Errors are
    /// returned to the caller, which decides how to surface them.
    async fn stream_chat(
        &self,
        request: ChatRequest,
        tools: &ToolRegistry,
        sink: mpsc::Sender<String>,
    ) -> DbResult<()>;
}
