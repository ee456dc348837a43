//! Database information tool.

use crate::db::{DbPool, SchemaInspector};
use crate::error::DbResult;
use crate::models::DatabaseInfo;
use crate::tools::names;
use crate::tools::registry::DbTool;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

/// Input for the get_database_info tool (takes no parameters).
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DatabaseInfoInput {}

pub struct DatabaseInfoTool {
    pool: DbPool,
}

impl DatabaseInfoTool {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DbTool for DatabaseInfoTool {
    type Input = DatabaseInfoInput;
    type Output = DatabaseInfo;

    const NAME: &'static str = names::GET_DATABASE_INFO;
    const DESCRIPTION: &'static str = "Get the PostgreSQL server version, database size, \
        non-system schemas and current database name.";

    async fn execute(&self, _input: DatabaseInfoInput) -> DbResult<DatabaseInfo> {
        let mut conn = self.pool.acquire().await?;
        SchemaInspector::database_info(&mut conn).await
    }
}
