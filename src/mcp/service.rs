//! MCP service implementation using rmcp.
//!
//! This module defines the MongoService struct, which exposes the single
//! `execute_mongo_command` tool via the MCP protocol using the rmcp framework's macros.

use crate::db::MongoConnection;
use crate::tools::command::{CommandInput, CommandToolHandler};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use tracing::{info, warn};

pub const TOOL_NAME: &str = "execute_mongo_command";

#[derive(Clone)]
pub struct MongoService {
    /// Command tool handler sharing the process-wide connection
    handler: CommandToolHandler<MongoConnection>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl MongoService {
    /// Create a new MongoService instance.
    ///
    /// # Arguments
    ///
    /// * `handler` - Command tool handler bound to the shared connection
    pub fn new(handler: CommandToolHandler<MongoConnection>) -> Self {
        Self {
            handler,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl MongoService {
    #[tool(
        description = "Execute a MongoDB command (given as JSON) against the configured database and return the reply as JSON.\nThe first key names the command, e.g. {\"ping\": 1}, {\"find\": \"users\", \"filter\": {\"age\": 30}}, {\"listCollections\": 1}.\nExtended JSON type wrappers ($date, $numberLong, $numberDecimal, $oid, $binary) are accepted.\nReplies use relaxed Extended JSON by default: dates, ObjectIds, binary and decimals stay tagged, but 32-bit and 64-bit integers are both plain numbers. Start the server with --extjson-mode canonical for exact numeric types."
    )]
    async fn execute_mongo_command(
        &self,
        Parameters(input): Parameters<CommandInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            tool = TOOL_NAME,
            request_id = ?context.id,
            has_command = input.command.is_some(),
            "Received tool call"
        );

        // Per-call failures are tool errors, never protocol errors.
        match self.handler.execute(input, context.ct.clone()).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => {
                warn!(tool = TOOL_NAME, error = %e, "Tool call failed");
                Ok(e.into_tool_result())
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for MongoService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mongo-mcp-server".to_owned(),
                title: Some("MongoDB MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Run MongoDB database commands against the configured database.\n\
                \n\
                ## Usage\n\
                Call `execute_mongo_command` with `command` set to the command as JSON text.\n\
                The first key is the command name, so keep keys in the intended order.\n\
                \n\
                ## Examples\n\
                - `{\"ping\": 1}`\n\
                - `{\"listCollections\": 1, \"nameOnly\": true}`\n\
                - `{\"find\": \"users\", \"filter\": {\"age\": 30}, \"limit\": 10}`\n\
                - `{\"aggregate\": \"orders\", \"pipeline\": [{\"$group\": {\"_id\": \"$status\", \"n\": {\"$sum\": 1}}}], \"cursor\": {}}`\n\
                \n\
                ## Results\n\
                The reply is Extended JSON. Query results are under `cursor.firstBatch`.\n\
                Relaxed mode (the default) prints integers as plain numbers; use\n\
                `--extjson-mode canonical` when exact numeric types matter.\n\
                Database errors are returned as tool errors with the server's code name and message."
                    .to_string(),
            ),
        }
    }
}
