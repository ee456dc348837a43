//! HTTP surface of the server.
//!
//! - `POST {base}/mcp`: direct tool invocation, behind the auth gate
//! - `GET {base}/mcp`, `GET {base}/mcp/tools`: server and tool metadata
//! - `POST {base}/chat`, `GET {base}/chat`: streaming chat and its metadata

pub mod chat;
pub mod http;
pub mod invoke;

pub use http::HttpTransport;

use crate::auth::{AuthConfig, auth_middleware};
use crate::inference::InferenceClient;
use crate::tools::ToolRegistry;
use axum::routing::{get, post};
use axum::{Router, middleware};
use std::sync::Arc;

/// Shared handler state; every field is reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ToolRegistry>,
    pub inference: Arc<dyn InferenceClient>,
    pub auth: Arc<AuthConfig>,
    pub max_tool_steps: usize,
}

impl AppState {
    pub fn new(
        registry: Arc<ToolRegistry>,
        inference: Arc<dyn InferenceClient>,
        auth: AuthConfig,
        max_tool_steps: usize,
    ) -> Self {
        Self {
            registry,
            inference,
            auth: Arc::new(auth),
            max_tool_steps,
        }
    }
}

/// Build the router with every endpoint under `base_path`.
///
/// `base_path` must be empty or start with `/` and have no trailing slash
/// (see `Config::normalized_base_path`).
pub fn build_router(state: AppState, base_path: &str) -> Router {
    let gate = middleware::from_fn_with_state(state.auth.clone(), auth_middleware);

    let api = Router::new()
        .route(
            "/mcp",
            post(invoke::invoke_tool)
                .layer(gate)
                .get(invoke::server_info),
        )
        .route("/mcp/tools", get(invoke::list_tools))
        .route("/chat", post(chat::chat).get(chat::chat_info))
        .with_state(state);

    if base_path.is_empty() {
        api
    } else {
        Router::new().nest(base_path, api)
    }
}
