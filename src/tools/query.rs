//! Query execution tool.
//!
//! This module implements the `execute_query` tool for read queries.
//! Statements that do not start with SELECT or WITH are rejected before a
//! connection is checked out.

use crate::db::{DbPool, executor};
use crate::error::DbResult;
use crate::models::{QueryParam, QueryResult};
use crate::tools::names;
use crate::tools::registry::DbTool;
use crate::tools::sql_guard::{check_read_query, inspect_read_query};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

/// Input for the execute_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct QueryInput {
    /// SQL statement starting with SELECT or WITH. Use $1, $2, ... placeholders for values.
    pub query: String,
    /// Positional parameters bound to $1, $2, ... in order
    #[serde(default, alias = "parameters")]
    pub params: Vec<QueryParam>,
}

/// Handler for the execute_query tool.
pub struct QueryTool {
    pool: DbPool,
}

impl QueryTool {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DbTool for QueryTool {
    type Input = QueryInput;
    type Output = QueryResult;

    const NAME: &'static str = names::EXECUTE_QUERY;
    const DESCRIPTION: &'static str = "Execute a read-only SQL query (must start with SELECT or WITH) \
        and return rows, row count and column metadata. Pass values through params, never inline them.";

    async fn execute(&self, input: QueryInput) -> DbResult<QueryResult> {
        check_read_query(&input.query)?;

        let inspection = inspect_read_query(&input.query);
        if !inspection.is_clean() {
            warn!(
                multiple_statements = inspection.multiple_statements,
                top_level_dml = ?inspection.top_level_dml,
                nested_dml = ?inspection.nested_dml,
                "Read query passed the prefix check but may modify data"
            );
        }

        let mut conn = self.pool.acquire().await?;
        executor::fetch_all(&mut conn, &input.query, &input.params).await
    }
}
