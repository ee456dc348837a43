//! Query execution engine.
//!
//! This module runs caller SQL on a checked-out connection:
//! - Parameterized reads returning JSON rows plus column metadata
//! - Parameterized writes returning the affected row count
//!
//! Both always go through the extended query protocol, so a string holding
//! several statements is refused by the server instead of running them all.
//! Statements are prepared before binding so that parameters are encoded as
//! the types the server inferred for their placeholders.

use crate::db::params::encode_params;
use crate::db::types::{RowToJson, field_info};
use crate::error::DbResult;
use crate::models::{FieldInfo, QueryParam, QueryResult};
use sqlx::postgres::{PgArguments, PgConnection, PgStatement};
use sqlx::{Either, Executor, Statement};
use std::time::Instant;
use tracing::debug;

/// Execute a read query and return rows and field metadata.
pub async fn fetch_all(
    conn: &mut PgConnection,
    sql: &str,
    params: &[QueryParam],
) -> DbResult<QueryResult> {
    let start = Instant::now();
    debug!(sql = %sql, params = ?param_types(params), "Executing query");

    let (statement, args) = prepare(conn, sql, params).await?;
    let rows = sqlx::query_with(sql, args).fetch_all(&mut *conn).await?;
    let fields: Vec<FieldInfo> = statement.columns().iter().map(field_info).collect();

    let json_rows = rows.iter().map(|r| r.to_json_map()).collect();
    let result = QueryResult::new(json_rows, fields);

    debug!(
        rows = result.row_count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Query finished"
    );
    Ok(result)
}

/// Execute a statement and return the number of affected rows.
pub async fn execute(conn: &mut PgConnection, sql: &str, params: &[QueryParam]) -> DbResult<u64> {
    let start = Instant::now();
    debug!(sql = %sql, params = ?param_types(params), "Executing statement");

    let (_, args) = prepare(conn, sql, params).await?;
    let result = sqlx::query_with(sql, args).execute(&mut *conn).await?;

    debug!(
        rows_affected = result.rows_affected(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Statement finished"
    );
    Ok(result.rows_affected())
}

/// Prepare (or look up) the statement and encode the parameters for it.
///
/// The driver caches statements by SQL text, so the run that follows binds
/// against this same prepared statement.
async fn prepare<'q>(
    conn: &mut PgConnection,
    sql: &'q str,
    params: &[QueryParam],
) -> DbResult<(PgStatement<'q>, PgArguments)> {
    let statement = (&mut *conn).prepare(sql).await?;
    let types = match statement.parameters() {
        Some(Either::Left(types)) => types.to_vec(),
        _ => Vec::new(),
    };
    let args = encode_params(params, &types)?;
    Ok((statement, args))
}

fn param_types(params: &[QueryParam]) -> Vec<&'static str> {
    params.iter().map(QueryParam::type_name).collect()
}
