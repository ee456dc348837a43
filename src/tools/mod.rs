//! Database tool implementations.
//!
//! This module contains all database tool handlers:
//! - `execute_query`: Execute SELECT/WITH queries
//! - `execute_mutation`: Execute any other statement
//! - `list_tables`: List tables in a schema
//! - `describe_table`: Get table schema information
//! - `execute_transaction`: Run a batch of statements atomically
//! - `get_database_info`: Server version, size and schemas
//! - `sql_guard`: Prefix allow-list and statement inspection
//! - `registry`: Name-based dispatch over all of the above

pub mod info;
pub mod query;
pub mod registry;
pub mod schema;
pub mod sql_guard;
pub mod transaction;
pub mod write;

pub use registry::{DbTool, Tool, ToolDescriptor, ToolRegistry, ToolResult};

/// Registered tool names.
pub mod names {
    pub const EXECUTE_QUERY: &str = "execute_query";
    pub const EXECUTE_MUTATION: &str = "execute_mutation";
    pub const LIST_TABLES: &str = "list_tables";
    pub const DESCRIBE_TABLE: &str = "describe_table";
    pub const EXECUTE_TRANSACTION: &str = "execute_transaction";
    pub const GET_DATABASE_INFO: &str = "get_database_info";

    /// All tools, in registration order.
    pub const ALL: [&str; 6] = [
        EXECUTE_QUERY,
        EXECUTE_MUTATION,
        LIST_TABLES,
        DESCRIBE_TABLE,
        EXECUTE_TRANSACTION,
        GET_DATABASE_INFO,
    ];
}
