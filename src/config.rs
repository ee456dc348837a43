//! Configuration handling for the PostgreSQL tool server.
//!
//! Every setting comes from a CLI flag or its environment variable.

use crate::db::PoolConfig;
use crate::inference::{DEFAULT_BASE_URL, DEFAULT_MAX_TOOL_STEPS, DEFAULT_MODEL, OpenAiConfig};
use clap::Parser;
use std::time::Duration;
use url::Url;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_BASE_PATH: &str = "/api";
pub const DEFAULT_MAX_CONNECTIONS: u32 = PoolConfig::DEFAULT_MAX_CONNECTIONS;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = PoolConfig::DEFAULT_IDLE_TIMEOUT_SECS;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = PoolConfig::DEFAULT_CONNECT_TIMEOUT_SECS;

/// Configuration for the server.
#[derive(Clone, Parser)]
#[command(
    name = "pg-tools-server",
    about = "HTTP tool server for PostgreSQL with an LLM chat endpoint",
    version,
    author
)]
pub struct Config {
    /// PostgreSQL connection string
    #[arg(long, value_name = "URL", env = "DATABASE_URL")]
    pub database_url: String,

    /// Require TLS for database connections
    #[arg(long, env = "DATABASE_SSL")]
    pub database_ssl: bool,

    /// Maximum pooled connections
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS, env = "DB_MAX_CONNECTIONS")]
    pub max_connections: u32,

    /// Seconds an idle pooled connection is kept
    #[arg(long, default_value_t = DEFAULT_IDLE_TIMEOUT_SECS, env = "DB_IDLE_TIMEOUT")]
    pub idle_timeout: u64,

    /// Seconds to wait for a pooled connection
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS, env = "DB_CONNECT_TIMEOUT")]
    pub connect_timeout: u64,

    /// Shared secret for the tool endpoint. Unset or empty leaves it open.
    #[arg(long, value_name = "KEY", env = "MCP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API key for the inference provider
    #[arg(long, value_name = "KEY", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, default_value = DEFAULT_BASE_URL, env = "OPENAI_BASE_URL")]
    pub openai_base_url: String,

    /// Chat model identifier
    #[arg(long, default_value = DEFAULT_MODEL, env = "OPENAI_MODEL")]
    pub model: String,

    /// Maximum model rounds that may call tools per chat request
    #[arg(long, default_value_t = DEFAULT_MAX_TOOL_STEPS, env = "CHAT_MAX_TOOL_STEPS")]
    pub max_tool_steps: usize,

    /// HTTP host to bind to
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "HTTP_PORT")]
    pub http_port: u16,

    /// Path prefix for all endpoints
    #[arg(long, default_value = DEFAULT_BASE_PATH, env = "API_BASE_PATH")]
    pub base_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &redact_url(&self.database_url))
            .field("database_ssl", &self.database_ssl)
            .field("max_connections", &self.max_connections)
            .field("api_key", &self.api_key().map(|_| "[REDACTED]"))
            .field("openai_api_key", &self.openai_api_key().map(|_| "[REDACTED]"))
            .field("openai_base_url", &self.openai_base_url)
            .field("model", &self.model)
            .field("http_host", &self.http_host)
            .field("http_port", &self.http_port)
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Configuration with defaults for everything but the connection string.
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            database_ssl: false,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT_SECS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            api_key: None,
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tool_steps: DEFAULT_MAX_TOOL_STEPS,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            base_path: DEFAULT_BASE_PATH.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Tool endpoint secret; empty counts as unset.
    pub fn api_key(&self) -> Option<&str> {
        non_empty(self.api_key.as_deref())
    }

    /// Inference credential; empty counts as unset.
    pub fn openai_api_key(&self) -> Option<&str> {
        non_empty(self.openai_api_key.as_deref())
    }

    /// Base path with a leading slash and no trailing slash. `/` becomes empty.
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }

    pub fn to_pool_config(&self) -> PoolConfig {
        PoolConfig {
            database_url: self.database_url.clone(),
            ssl: self.database_ssl,
            max_connections: self.max_connections,
            idle_timeout: Duration::from_secs(self.idle_timeout),
            connect_timeout: Duration::from_secs(self.connect_timeout),
        }
    }

    pub fn to_openai_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            api_key: self.openai_api_key().map(String::from),
            base_url: self.openai_base_url.clone(),
            model: self.model.clone(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Connection string with the password masked, for logging.
///
/// Strings that are not URLs (key/value form) are replaced entirely.
pub fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                // set_password only fails for URLs that cannot carry credentials.
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => "<unparseable connection string>".to_string(),
    }
}
