//! Database access layer.
//!
//! This module provides database access functionality:
//! - Connection pool handle and checked-out connection guard
//! - Parameter binding
//! - Query execution
//! - Schema introspection
//! - Row decoding

pub mod executor;
pub mod params;
pub mod pool;
pub mod schema;
pub mod types;

pub use pool::{DbPool, PoolConfig, PoolStats, PooledConnection};
pub use schema::SchemaInspector;
