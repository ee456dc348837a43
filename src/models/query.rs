//! Query-related data models.
//!
//! This module defines parameter values and result shapes for SQL execution.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A parameter value for parameterized queries.
///
/// Values are bound positionally to `$1`, `$2`, ... placeholders and converted
/// to the type the server infers for each one, so `"2024-01-01T00:00:00Z"`
/// binds to a `timestamptz` placeholder as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Object or array, bound as JSON or as a PostgreSQL array
    Json(JsonValue),
}

impl QueryParam {
    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Json(_) => "json",
        }
    }
}

/// Column metadata reported alongside query rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub name: String,
    /// PostgreSQL type name (e.g., "INT4", "TEXT", "JSONB")
    pub data_type: String,
    /// Type OID, `None` for types without a stable OID
    pub data_type_id: Option<u32>,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, data_type_id: Option<u32>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            data_type_id,
        }
    }
}

/// Rows returned by a read query.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    pub row_count: usize,
    pub fields: Vec<FieldInfo>,
}

impl QueryResult {
    pub fn new(rows: Vec<serde_json::Map<String, JsonValue>>, fields: Vec<FieldInfo>) -> Self {
        Self {
            row_count: rows.len(),
            rows,
            fields,
        }
    }
}

/// Outcome of a data-modifying statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    /// Command verb, e.g. "INSERT", "UPDATE", "CREATE"
    pub command: String,
    pub row_count: u64,
}
