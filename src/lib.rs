//! PostgreSQL tool server library.
//!
//! Six database tools (read queries, mutations, schema introspection,
//! transactions and server info) exposed over HTTP, both for direct
//! invocation and to a streaming LLM chat endpoint that calls them.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod inference;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::{DbError, DbResult};
pub use tools::ToolRegistry;
pub use transport::{AppState, build_router};
