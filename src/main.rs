//! PostgreSQL tool server - main entry point.

use clap::Parser;
use pg_tools_server::auth::AuthConfig;
use pg_tools_server::config::{Config, redact_url};
use pg_tools_server::db::DbPool;
use pg_tools_server::inference::{InferenceClient, OpenAiClient};
use pg_tools_server::tools::ToolRegistry;
use pg_tools_server::transport::{AppState, HttpTransport, build_router};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_tracing(&config);

    info!(
        database = %redact_url(&config.database_url),
        "Starting pg-tools-server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let pool = DbPool::connect_lazy(&config.to_pool_config())?;
    let registry = Arc::new(ToolRegistry::new(pool.clone()));

    let auth = AuthConfig::new(config.api_key());
    if !auth.is_enabled() {
        warn!("MCP_API_KEY is not set; the tool endpoint accepts unauthenticated requests");
    }

    let inference: Arc<dyn InferenceClient> =
        Arc::new(OpenAiClient::new(config.to_openai_config()));
    if !inference.is_configured() {
        warn!("OPENAI_API_KEY is not set; chat requests will fail");
    }

    let base_path = config.normalized_base_path();
    let state = AppState::new(registry, inference, auth, config.max_tool_steps);
    let app = build_router(state, &base_path);

    info!(
        host = %config.http_host,
        port = config.http_port,
        base_path = %base_path,
        tools = ?pg_tools_server::tools::names::ALL,
        "Serving HTTP API"
    );
    let transport = HttpTransport::new(&config.http_host, config.http_port);
    let result = transport.run(app).await;

    info!("Closing database connections");
    pool.close().await;

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
