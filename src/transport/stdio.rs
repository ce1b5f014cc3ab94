//! Stdio transport for the MCP server.
//!
//! This transport uses standard input/output for communication,
//! which is the standard mode for CLI-based MCP integrations.

use crate::db::MongoConnection;
use crate::error::{MongoMcpError, MongoMcpResult};
use crate::mcp::MongoService;
use crate::tools::command::CommandToolHandler;
use crate::transport::{Transport, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use tracing::{info, warn};

/// Stdio transport implementation.
///
/// This transport reads JSON-RPC messages from stdin and writes
/// responses to stdout, following the MCP protocol specification.
pub struct StdioTransport {
    handler: CommandToolHandler<MongoConnection>,
}

impl StdioTransport {
    /// Create a new stdio transport serving the given command handler.
    pub fn new(handler: CommandToolHandler<MongoConnection>) -> Self {
        Self { handler }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> MongoMcpResult<()> {
        info!(transport = self.name(), "Starting MCP server");

        let service = MongoService::new(self.handler.clone());

        let running_service = service.serve(stdio()).await.map_err(|e| {
            MongoMcpError::transport(format!("Failed to start stdio transport: {}", e))
        })?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(quit_reason) => {
                        info!(reason = ?quit_reason, "Stdio transport completed normally");
                    }
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        self.handler.executor().close().await;
                        return Err(MongoMcpError::transport(format!(
                            "Stdio transport error: {}",
                            e
                        )));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            tokio::spawn(async {
                wait_for_signal().await;
                warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
        }

        self.handler.executor().close().await;

        if shutdown_requested {
            // tokio::select! cannot interrupt the blocking stdin read
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}
