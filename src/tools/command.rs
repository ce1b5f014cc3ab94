//! Command execution tool.
//!
//! This module implements the `execute_mongo_command` MCP tool: the `command`
//! parameter is parsed as Extended JSON into an ordered document, run verbatim as a
//! generic database command, and the reply is rendered back as Extended JSON text.
//! Input and parse failures are reported without contacting the database.

use crate::config::ExtJsonMode;
use crate::db::CommandExecutor;
use crate::error::{MongoMcpError, MongoMcpResult};
use crate::tools::extjson;
use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const COMMAND_PARAM: &str = "command";

/// Input for the execute_mongo_command tool.
///
/// `command` is kept as a raw JSON value so that a missing or non-string
/// parameter is reported as a tool error instead of a protocol error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandInput {
    #[serde(default)]
    pub command: Option<JsonValue>,
}

impl CommandInput {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: Some(JsonValue::String(command.into())),
        }
    }

    /// The command text, or an input error if it is missing or not a string.
    pub fn command_text(&self) -> MongoMcpResult<&str> {
        match &self.command {
            Some(JsonValue::String(text)) => Ok(text),
            None | Some(JsonValue::Null) => Err(MongoMcpError::invalid_input(format!(
                "Parameter '{}' is required",
                COMMAND_PARAM
            ))),
            Some(_) => Err(MongoMcpError::invalid_input(format!(
                "Parameter '{}' must be a string",
                COMMAND_PARAM
            ))),
        }
    }
}

// Advertised schema: a single required string. Deserialization stays lenient (see above).
impl JsonSchema for CommandInput {
    fn schema_name() -> Cow<'static, str> {
        "CommandInput".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "MongoDB command as JSON text, e.g. {\"ping\": 1} or {\"find\": \"collection\", \"filter\": {\"field\": \"value\"}}. Key order matters: the first key is the command name. Extended JSON wrappers ($date, $numberLong, $oid, ...) are supported."
                }
            },
            "required": ["command"]
        })
    }
}

/// Handler for the command tool, generic over the executor so it can be driven
/// without a live server.
#[derive(Debug)]
pub struct CommandToolHandler<E> {
    executor: Arc<E>,
    command_timeout: Option<Duration>,
    extjson_mode: ExtJsonMode,
}

impl<E> Clone for CommandToolHandler<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            command_timeout: self.command_timeout,
            extjson_mode: self.extjson_mode,
        }
    }
}

impl<E: CommandExecutor> CommandToolHandler<E> {
    /// Create a new command tool handler.
    ///
    /// # Arguments
    ///
    /// * `executor` - Shared executor, never mutated by the handler
    /// * `command_timeout` - Server-side limit per command, `None` for no limit
    /// * `extjson_mode` - Extended JSON flavour of the rendered reply
    pub fn new(
        executor: Arc<E>,
        command_timeout: Option<Duration>,
        extjson_mode: ExtJsonMode,
    ) -> Self {
        Self {
            executor,
            command_timeout,
            extjson_mode,
        }
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    /// Run one tool call and return the reply as Extended JSON text.
    ///
    /// `cancellation` is the caller's token; when it fires the in-flight command
    /// is dropped and an execution error is returned.
    pub async fn execute(
        &self,
        input: CommandInput,
        cancellation: CancellationToken,
    ) -> MongoMcpResult<String> {
        let text = input.command_text()?;
        let command = extjson::parse_command(text).inspect_err(|e| {
            warn!(error = %e, "Failed to parse command JSON");
        })?;

        let command_name = command.keys().next().cloned().unwrap_or_default();
        info!(
            command = %command_name,
            database = %self.executor.database_name(),
            "Executing MongoDB command"
        );
        debug!(document = %command, "Parsed command");

        let start = Instant::now();
        let reply = tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                warn!(command = %command_name, "Command cancelled by caller");
                return Err(MongoMcpError::cancelled());
            }
            result = self.run_with_timeout(command) => result,
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let reply = match reply {
            Ok(reply) => {
                info!(command = %command_name, elapsed_ms, "Command succeeded");
                reply
            }
            Err(e) => {
                let (code, code_name) = e.server_code().unzip();
                warn!(
                    command = %command_name,
                    elapsed_ms,
                    error = %e,
                    code = ?code,
                    code_name = ?code_name,
                    "Command failed"
                );
                return Err(e);
            }
        };

        let rendered = extjson::render_reply(&reply, self.extjson_mode).inspect_err(|e| {
            warn!(error = %e, "Failed to serialize command reply");
        })?;
        debug!(response = %rendered, "Command response");
        Ok(rendered)
    }

    async fn run_with_timeout(
        &self,
        command: mongodb::bson::Document,
    ) -> MongoMcpResult<mongodb::bson::Document> {
        match self.command_timeout {
            Some(limit) => tokio::time::timeout(limit, self.executor.run_command(command))
                .await
                .map_err(|_| MongoMcpError::timed_out(limit))?,
            None => self.executor.run_command(command).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_text_accepts_string() {
        let input = CommandInput::new(r#"{"ping": 1}"#);
        assert_eq!(input.command_text().unwrap(), r#"{"ping": 1}"#);
    }

    #[test]
    fn test_command_text_rejects_missing() {
        let err = CommandInput::default().command_text().unwrap_err();
        assert!(matches!(err, MongoMcpError::InvalidInput { .. }));
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn test_command_text_rejects_null() {
        let input = CommandInput {
            command: Some(JsonValue::Null),
        };
        assert!(matches!(
            input.command_text().unwrap_err(),
            MongoMcpError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_command_text_rejects_object() {
        let input = CommandInput {
            command: Some(json!({ "ping": 1 })),
        };
        let err = input.command_text().unwrap_err();
        assert!(err.to_string().contains("must be a string"));
    }

    #[test]
    fn test_input_deserializes_leniently() {
        let missing: CommandInput = serde_json::from_value(json!({})).unwrap();
        assert!(missing.command.is_none());

        let number: CommandInput = serde_json::from_value(json!({ "command": 5 })).unwrap();
        assert_eq!(number.command, Some(json!(5)));
    }

    #[test]
    fn test_schema_requires_string_command() {
        let schema = schemars::schema_for!(CommandInput);
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["properties"]["command"]["type"], "string");
        assert_eq!(value["required"], json!(["command"]));
    }
}
