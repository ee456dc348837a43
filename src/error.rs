//! Error types for the PostgreSQL tool server.
//!
//! All errors use `thiserror`. Tool failures are converted into a structured
//! `{"error": ...}` result at the tool boundary; the HTTP layer only maps the
//! few errors that are allowed to change the response status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
    },

    #[error("Permission denied: {operation} - {reason}")]
    Permission { operation: String, reason: String },

    #[error("Schema error: {message} (object: {object})")]
    Schema { message: String, object: String },

    #[error("Transaction rolled back at statement {statement_index}: {message}")]
    Transaction {
        message: String,
        statement_index: usize,
    },

    #[error("Timeout: {operation} timed out")]
    Timeout { operation: String },

    #[error("Unknown tool: {name}")]
    ToolNotFound { name: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Invalid or missing API key")]
    Unauthorized,

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Inference provider error: {message}")]
    Inference { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
        }
    }

    pub fn permission(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Permission {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn schema(message: impl Into<String>, object: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            object: object.into(),
        }
    }

    /// Create a transaction error for the statement at `statement_index` (0-based).
    pub fn transaction(message: impl Into<String>, statement_index: usize) -> Self {
        Self::Transaction {
            message: message.into(),
            statement_index,
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound { name: name.into() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Message reported to tool callers.
    ///
    /// Database errors carry the SQLSTATE so callers (and models) can tell a
    /// syntax error from a constraint violation.
    pub fn client_message(&self) -> String {
        match self {
            Self::Database {
                message,
                sql_state: Some(code),
            } => format!("{} (SQLSTATE: {})", message, code),
            Self::Database { message, .. } => message.clone(),
            _ => self.to_string(),
        }
    }

    /// HTTP status used when this error terminates a request outright.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidInput { .. } | Self::ToolNotFound { .. } => StatusCode::BAD_REQUEST,
            Self::Inference { .. } => StatusCode::BAD_GATEWAY,
            Self::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(db_err.message(), code)
            }
            sqlx::Error::RowNotFound => DbError::database("No rows returned", None),
            sqlx::Error::PoolTimedOut => DbError::timeout("connection pool acquire"),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Restart the server")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify DATABASE_SSL and the server's TLS configuration",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::TypeNotFound { type_name } => DbError::schema(
                format!("Type not found: {}", type_name),
                type_name.to_string(),
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::schema(format!("Column not found: {}", col), col.to_string())
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

impl IntoResponse for DbError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.client_message() });
        (self.status_code(), axum::Json(body)).into_response()
    }
}
