//! Tool registry.
//!
//! Each tool is a typed [`DbTool`]: a `serde` input struct (with its JSON
//! Schema derived by `schemars`), an output type and an async `execute`.
//! The registry erases those types behind [`Tool`] so the HTTP endpoint and
//! the inference client can dispatch by name with raw JSON parameters.

use crate::db::DbPool;
use crate::error::{DbError, DbResult};
use crate::tools::info::DatabaseInfoTool;
use crate::tools::query::QueryTool;
use crate::tools::schema::{DescribeTableTool, ListTablesTool};
use crate::tools::transaction::TransactionTool;
use crate::tools::write::MutationTool;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Instant;
use tracing::{info, warn};

/// Outcome of one tool invocation.
///
/// Serialized untagged: the success payload as-is, or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResult {
    Failure { error: String },
    Success(JsonValue),
}

impl ToolResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Text form handed back to a model as a tool message.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
    }
}

impl From<DbError> for ToolResult {
    fn from(err: DbError) -> Self {
        Self::failure(err.client_message())
    }
}

/// Public description of a tool, as listed by the catalog endpoint and
/// handed to the model.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: JsonValue,
}

/// A typed tool implementation.
#[async_trait]
pub trait DbTool: Send + Sync + 'static {
    type Input: DeserializeOwned + JsonSchema + Send;
    type Output: Serialize + Send;

    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    async fn execute(&self, input: Self::Input) -> DbResult<Self::Output>;
}

/// Type-erased tool, dispatched by name with JSON parameters.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> JsonValue;
    async fn call(&self, params: JsonValue) -> DbResult<JsonValue>;
}

struct Typed<T>(T);

#[async_trait]
impl<T: DbTool> Tool for Typed<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn description(&self) -> &'static str {
        T::DESCRIPTION
    }

    fn input_schema(&self) -> JsonValue {
        input_schema_for::<T::Input>()
    }

    async fn call(&self, params: JsonValue) -> DbResult<JsonValue> {
        let params = match params {
            JsonValue::Null => JsonValue::Object(serde_json::Map::new()),
            other => other,
        };
        let input: T::Input = serde_json::from_value(params)
            .map_err(|e| DbError::invalid_input(format!("{} parameters: {}", T::NAME, e)))?;
        let output = self.0.execute(input).await?;
        serde_json::to_value(output)
            .map_err(|e| DbError::internal(format!("Failed to serialize result: {}", e)))
    }
}

/// JSON Schema for a tool input, without the `$schema` meta key.
pub fn input_schema_for<T: JsonSchema>() -> JsonValue {
    let mut value = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
    }
    value
}

/// The fixed set of tools, built once at startup around one pool.
pub struct ToolRegistry {
    pool: DbPool,
    tools: Vec<Box<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish_non_exhaustive()
    }
}

impl ToolRegistry {
    /// Register every tool against the given pool.
    pub fn new(pool: DbPool) -> Self {
        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(Typed(QueryTool::new(pool.clone()))),
            Box::new(Typed(MutationTool::new(pool.clone()))),
            Box::new(Typed(ListTablesTool::new(pool.clone()))),
            Box::new(Typed(DescribeTableTool::new(pool.clone()))),
            Box::new(Typed(TransactionTool::new(pool.clone()))),
            Box::new(Typed(DatabaseInfoTool::new(pool.clone()))),
        ];
        Self { pool, tools }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|t| ToolDescriptor {
                name: t.name(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Validate and run a tool. Every failure comes back as a [`ToolResult::Failure`].
    pub async fn invoke(&self, name: &str, params: JsonValue) -> ToolResult {
        let Some(tool) = self.get(name) else {
            warn!(tool = %name, "Unknown tool requested");
            return DbError::tool_not_found(name).into();
        };

        let start = Instant::now();
        match tool.call(params).await {
            Ok(payload) => {
                info!(
                    tool = %name,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Tool succeeded"
                );
                ToolResult::Success(payload)
            }
            Err(err) => {
                warn!(
                    tool = %name,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %err,
                    suggestion = err.suggestion(),
                    "Tool failed"
                );
                err.into()
            }
        }
    }
}
