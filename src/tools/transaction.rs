//! Transaction tool.
//!
//! `execute_transaction` runs an ordered batch of statements on one
//! connection inside one transaction. The first failure rolls the whole
//! batch back and is reported with its statement index; otherwise the
//! batch commits and each statement's command and row count is returned.
//!
//! A fault between BEGIN and COMMIT drops the sqlx `Transaction`, which
//! issues the rollback, so no path reports success with a partial commit.
//! Statements that would end the transaction early (`COMMIT`, `ROLLBACK`,
//! `BEGIN`, `SAVEPOINT`, ...) are refused before a connection is taken.

use crate::db::{DbPool, executor};
use crate::error::{DbError, DbResult};
use crate::models::{CommandResult, QueryParam};
use crate::tools::names;
use crate::tools::registry::DbTool;
use crate::tools::sql_guard::{command_verb, transaction_control_verb};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::Connection;
use tracing::{info, warn};

/// One statement of a batch.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TransactionStatement {
    /// SQL statement
    pub query: String,
    /// Positional parameters bound to $1, $2, ... in order
    #[serde(default, alias = "parameters")]
    pub params: Vec<QueryParam>,
}

/// Input for the execute_transaction tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TransactionInput {
    /// Statements to run in order. All commit together or none do.
    #[serde(alias = "statements")]
    pub queries: Vec<TransactionStatement>,
}

/// Output from the execute_transaction tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TransactionOutput {
    pub success: bool,
    /// Per-statement outcome, in input order
    pub results: Vec<CommandResult>,
}

pub struct TransactionTool {
    pool: DbPool,
}

impl TransactionTool {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DbTool for TransactionTool {
    type Input = TransactionInput;
    type Output = TransactionOutput;

    const NAME: &'static str = names::EXECUTE_TRANSACTION;
    const DESCRIPTION: &'static str = "Execute several SQL statements in one transaction. \
        If any statement fails, everything is rolled back and the failing statement is reported.";

    async fn execute(&self, input: TransactionInput) -> DbResult<TransactionOutput> {
        if input.queries.is_empty() {
            return Err(DbError::invalid_input("queries must contain at least one statement"));
        }
        if let Some(index) = input.queries.iter().position(|s| s.query.trim().is_empty()) {
            return Err(DbError::invalid_input(format!(
                "Statement {} has an empty query",
                index
            )));
        }
        for (index, statement) in input.queries.iter().enumerate() {
            if let Some(verb) = transaction_control_verb(&statement.query) {
                return Err(DbError::invalid_input(format!(
                    "Statement {} is a transaction control command ({}); \
                     execute_transaction begins and commits the transaction itself",
                    index, verb
                )));
            }
        }

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut results = Vec::with_capacity(input.queries.len());
        for (index, statement) in input.queries.iter().enumerate() {
            match executor::execute(&mut tx, &statement.query, &statement.params).await {
                Ok(row_count) => results.push(CommandResult {
                    command: command_verb(&statement.query),
                    row_count,
                }),
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        // The connection is dropped with the transaction still open;
                        // the pool resets it before reuse.
                        warn!(error = %rollback_err, "Explicit rollback failed");
                    }
                    warn!(statement_index = index, error = %err, "Transaction rolled back");
                    return Err(DbError::transaction(err.client_message(), index));
                }
            }
        }

        tx.commit().await.map_err(|e| {
            let err = DbError::from(e);
            DbError::database(
                format!("COMMIT failed, transaction rolled back: {}", err.client_message()),
                None,
            )
        })?;

        info!(statements = results.len(), "Transaction committed");
        Ok(TransactionOutput {
            success: true,
            results,
        })
    }
}
