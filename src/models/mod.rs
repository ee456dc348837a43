//! Data models for the PostgreSQL tool server.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod schema;

// Re-export commonly used types
pub use query::{CommandResult, FieldInfo, QueryParam, QueryResult};
pub use schema::{
    ColumnDefinition, DEFAULT_SCHEMA, DatabaseInfo, ForeignKey, TableInfo, TableList, TableSchema,
    TableType,
};
