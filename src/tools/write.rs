//! Write operation tool.
//!
//! This module implements the `execute_mutation` tool. Any statement is
//! accepted; the result carries the affected row count and the command verb.

use crate::db::{DbPool, executor};
use crate::error::{DbError, DbResult};
use crate::models::{CommandResult, QueryParam};
use crate::tools::names;
use crate::tools::registry::DbTool;
use crate::tools::sql_guard::command_verb;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

/// Input for the execute_mutation tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MutationInput {
    /// SQL statement to execute (INSERT, UPDATE, DELETE, or DDL like CREATE/DROP/ALTER)
    pub query: String,
    /// Positional parameters bound to $1, $2, ... in order
    #[serde(default, alias = "parameters")]
    pub params: Vec<QueryParam>,
}

pub struct MutationTool {
    pool: DbPool,
}

impl MutationTool {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DbTool for MutationTool {
    type Input = MutationInput;
    type Output = CommandResult;

    const NAME: &'static str = names::EXECUTE_MUTATION;
    const DESCRIPTION: &'static str = "Execute a data-modifying SQL statement (INSERT, UPDATE, DELETE, \
        or DDL) and return the command and number of affected rows.";

    async fn execute(&self, input: MutationInput) -> DbResult<CommandResult> {
        if input.query.trim().is_empty() {
            return Err(DbError::invalid_input("Query must not be empty"));
        }

        let mut conn = self.pool.acquire().await?;
        let row_count = executor::execute(&mut conn, &input.query, &input.params).await?;
        let command = command_verb(&input.query);

        info!(command = %command, row_count = row_count, "Mutation executed");
        Ok(CommandResult { command, row_count })
    }
}
