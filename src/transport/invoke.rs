//! Tool invocation endpoint handlers.

use super::AppState;
use crate::db::PoolStats;
use crate::error::DbError;
use crate::tools::ToolDescriptor;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

/// Body of `POST {base}/mcp`.
#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    pub tool: String,
    #[serde(default)]
    pub parameters: JsonValue,
}

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub tools: Vec<&'static str>,
    pub pool: PoolStats,
}

#[derive(Debug, Serialize)]
pub struct ToolCatalog {
    pub tools: Vec<ToolDescriptor>,
}

/// Run one tool. Business outcomes, failures included, are always 200.
pub async fn invoke_tool(
    State(state): State<AppState>,
    payload: Result<Json<InvokeRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Malformed tool request");
            return DbError::invalid_input(rejection.body_text()).into_response();
        }
    };

    debug!(tool = %request.tool, "Tool request");
    let result = state
        .registry
        .invoke(&request.tool, request.parameters)
        .await;
    Json(result).into_response()
}

pub async fn server_info(State(state): State<AppState>) -> Json<ServerInfo> {
    Json(ServerInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
        tools: state.registry.names(),
        pool: state.registry.pool().stats(),
    })
}

pub async fn list_tools(State(state): State<AppState>) -> Json<ToolCatalog> {
    Json(ToolCatalog {
        tools: state.registry.descriptors(),
    })
}
