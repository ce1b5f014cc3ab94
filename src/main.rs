//! MongoDB MCP Server - Main entry point.
//!
//! This server provides an MCP (Model Context Protocol) tool for AI assistants
//! to run MongoDB database commands.

use clap::Parser;
use mongo_mcp_server::auth::AuthConfig;
use mongo_mcp_server::config::{Config, TransportMode};
use mongo_mcp_server::db::MongoConnection;
use mongo_mcp_server::tools::CommandToolHandler;
use mongo_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; stdout belongs to the stdio transport.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    init_tracing(&config);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    info!(
        transport = %config.transport,
        extjson_mode = %config.extjson_mode,
        "Starting MongoDB MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let auth = AuthConfig::from_tokens(config.auth_tokens.clone())?;

    let settings = config.mongo_settings();
    let connection = match MongoConnection::connect(&settings).await {
        Ok(connection) => Arc::new(connection),
        Err(e) => {
            error!(error = %e, suggestion = ?e.suggestion(), "Failed to connect to MongoDB");
            return Err(e.into());
        }
    };

    let handler = CommandToolHandler::new(
        connection,
        config.command_timeout_duration(),
        config.extjson_mode,
    );

    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            let transport = StdioTransport::new(handler);
            transport.run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.server_port,
                endpoint = %config.mcp_endpoint,
                auth_enabled = auth.is_enabled(),
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(
                handler,
                auth,
                &config.http_host,
                config.server_port,
                &config.mcp_endpoint,
            );
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
