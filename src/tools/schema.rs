//! Schema introspection tools.
//!
//! This module implements the `list_tables` and `describe_table` tools.

use crate::db::{DbPool, SchemaInspector};
use crate::error::{DbError, DbResult};
use crate::models::{DEFAULT_SCHEMA, TableList, TableSchema};
use crate::tools::names;
use crate::tools::registry::DbTool;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

/// Input for the list_tables tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListTablesInput {
    /// Schema to list. Default: "public"
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Include views in the result. Default: false
    #[serde(default, alias = "includeViews")]
    pub include_views: bool,
}

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DescribeTableInput {
    /// Table name to describe
    #[serde(alias = "tableName")]
    pub table_name: String,
    /// Schema containing the table. Default: "public"
    #[serde(default = "default_schema")]
    pub schema: String,
}

pub struct ListTablesTool {
    pool: DbPool,
}

impl ListTablesTool {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DbTool for ListTablesTool {
    type Input = ListTablesInput;
    type Output = TableList;

    const NAME: &'static str = names::LIST_TABLES;
    const DESCRIPTION: &'static str =
        "List tables in a schema (default \"public\"), ordered by name. Set include_views to list views too.";

    async fn execute(&self, input: ListTablesInput) -> DbResult<TableList> {
        let mut conn = self.pool.acquire().await?;
        SchemaInspector::list_tables(&mut conn, &input.schema, input.include_views).await
    }
}

pub struct DescribeTableTool {
    pool: DbPool,
}

impl DescribeTableTool {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DbTool for DescribeTableTool {
    type Input = DescribeTableInput;
    type Output = TableSchema;

    const NAME: &'static str = names::DESCRIBE_TABLE;
    const DESCRIPTION: &'static str = "Describe a table: columns in ordinal order (type, nullability, \
        default, max length), primary key columns and foreign keys.";

    async fn execute(&self, input: DescribeTableInput) -> DbResult<TableSchema> {
        if input.table_name.trim().is_empty() {
            return Err(DbError::invalid_input("table_name must not be empty"));
        }

        let mut conn = self.pool.acquire().await?;
        SchemaInspector::describe_table(&mut conn, &input.table_name, &input.schema).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_tables_defaults() {
        let input: ListTablesInput = serde_json::from_value(json!({})).unwrap();
        assert_eq!(input.schema, "public");
        assert!(!input.include_views);
    }

    #[test]
    fn test_describe_table_accepts_camel_case_name() {
        let input: DescribeTableInput =
            serde_json::from_value(json!({"tableName": "users"})).unwrap();
        assert_eq!(input.table_name, "users");
        assert_eq!(input.schema, "public");
    }

    #[test]
    fn test_describe_table_requires_name() {
        assert!(serde_json::from_value::<DescribeTableInput>(json!({"schema": "app"})).is_err());
    }
}
