//! Conversational endpoint.
//!
//! The model conversation runs in a spawned task that writes text chunks
//! into a bounded channel; the response body is the receiving end, so text
//! reaches the caller as it is produced. A dropped caller closes the
//! channel and the task stops at its next send.

use super::AppState;
use crate::error::DbError;
use crate::inference::{ChatMessage, ChatRequest, SYSTEM_PROMPT};
use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};

/// Chunks buffered between the model task and the response body.
const CHAT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatInfo {
    pub status: &'static str,
    pub model: String,
    pub configured: bool,
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> Response {
    if !state.inference.is_configured() {
        error!("Chat request rejected: inference provider is not configured");
        return DbError::configuration("OPENAI_API_KEY is not set").into_response();
    }

    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Malformed chat request");
            return DbError::invalid_input(rejection.body_text()).into_response();
        }
    };
    if body.messages.is_empty() {
        return DbError::invalid_input("messages must not be empty").into_response();
    }

    info!(messages = body.messages.len(), "Chat request");
    let request = ChatRequest {
        system: SYSTEM_PROMPT.to_string(),
        messages: body.messages,
        max_tool_steps: state.max_tool_steps,
    };

    let (tx, rx) = mpsc::channel::<String>(CHAT_CHANNEL_CAPACITY);
    let inference = state.inference.clone();
    let registry = state.registry.clone();
    tokio::spawn(async move {
        if let Err(err) = inference.stream_chat(request, &registry, tx.clone()).await {
            error!(error = %err, "Chat stream failed");
            let _ = tx
                .send(format!("\n\n[error] {}", err.client_message()))
                .await;
        }
    });

    let stream = ReceiverStream::new(rx).map(Ok::<_, Infallible>);
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}

pub async fn chat_info(State(state): State<AppState>) -> Json<ChatInfo> {
    Json(ChatInfo {
        status: "ok",
        model: state.inference.model().to_string(),
        configured: state.inference.is_configured(),
    })
}
