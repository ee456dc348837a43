//! Schema-related data models.
//!
//! This module defines types for catalog introspection results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Schema used when the caller does not name one.
pub const DEFAULT_SCHEMA: &str = "public";

/// One entry of a table listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TableInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub table_type: TableType,
}

impl TableInfo {
    /// Create a new table info.
    pub fn new(name: impl Into<String>, table_type: TableType) -> Self {
        Self {
            name: name.into(),
            table_type,
        }
    }
}

/// Type of database table object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    Table,
    View,
    ForeignTable,
    TemporaryTable,
}

impl TableType {
    /// Parse an `information_schema.tables.table_type` value.
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "VIEW" => Self::View,
            "FOREIGN" | "FOREIGN TABLE" => Self::ForeignTable,
            "LOCAL TEMPORARY" => Self::TemporaryTable,
            _ => Self::Table,
        }
    }
}

impl std::fmt::Display for TableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::View => write!(f, "view"),
            Self::ForeignTable => write!(f, "foreign_table"),
            Self::TemporaryTable => write!(f, "temporary_table"),
        }
    }
}

/// Result of a table listing for one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TableList {
    pub schema: String,
    pub tables: Vec<TableInfo>,
    pub count: usize,
}

impl TableList {
    pub fn new(schema: impl Into<String>, tables: Vec<TableInfo>) -> Self {
        Self {
            schema: schema.into(),
            count: tables.len(),
            tables,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub schema: String,
    pub table: String,
    /// Ordered by ordinal position
    pub columns: Vec<ColumnDefinition>,
    /// Ordered by key position
    pub primary_keys: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableSchema {
    /// Create a new table schema.
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            columns: Vec::new(),
            primary_keys: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Get the fully qualified table name.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub name: String,
    /// `information_schema` type (e.g., `integer`, `character varying`)
    pub data_type: String,
    pub nullable: bool,
    /// Default expression as written in the catalog (e.g., `nextval('users_id_seq'::regclass)`)
    pub default: Option<String>,
    /// Character length limit, if any
    pub max_length: Option<i32>,
}

impl ColumnDefinition {
    /// Create a new column definition.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            default: None,
            max_length: None,
        }
    }

    pub fn with_default(mut self, default: Option<String>) -> Self {
        self.default = default;
        self
    }

    pub fn with_max_length(mut self, max_length: Option<i32>) -> Self {
        self.max_length = max_length;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub column: String,
    pub references_schema: String,
    pub references_table: String,
    pub references_column: String,
    /// Constraint name
    pub constraint: String,
}

/// Server-level facts about the connected database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseInfo {
    /// Output of `version()`
    pub version: String,
    /// Human-readable size from `pg_size_pretty`
    pub size: String,
    /// Non-system schemas, sorted
    pub schemas: Vec<String>,
    /// Current database name
    pub database: String,
}
