//! Error types for the MongoDB MCP Server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Startup errors (configuration, connectivity, transport) are fatal. Every other
//! variant is produced per tool call and reported back to the caller as a tool
//! error so that one bad request never takes the server down.

use rmcp::model::{CallToolResult, Content};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MongoMcpError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Connection failed: {message}")]
    Connectivity { message: String, suggestion: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Failed to parse command JSON: {message}")]
    Parse { message: String },

    #[error("MongoDB command failed: {message}")]
    Execution {
        message: String,
        /// Server error code, only present for command errors (e.g. 59 for CommandNotFound)
        code: Option<i32>,
        code_name: Option<String>,
    },

    #[error("Failed to serialize command reply: {message}")]
    Serialization { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl MongoMcpError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connectivity error with a helpful suggestion.
    pub fn connectivity(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create an execution error without server error details.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
            code: None,
            code_name: None,
        }
    }

    /// The caller cancelled the request while the command was in flight.
    pub fn cancelled() -> Self {
        Self::execution("command was cancelled by the caller")
    }

    /// The command outlived the server-side command timeout.
    pub fn timed_out(limit: Duration) -> Self {
        Self::execution(format!("command timed out after {:?}", limit))
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connectivity { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Server error code and code name, only present for command errors.
    pub fn server_code(&self) -> Option<(i32, &str)> {
        match self {
            Self::Execution {
                code: Some(code),
                code_name,
                ..
            } => Some((*code, code_name.as_deref().unwrap_or_default())),
            _ => None,
        }
    }

    /// Render a per-call error as a tool failure result.
    pub fn into_tool_result(self) -> CallToolResult {
        CallToolResult::error(vec![Content::text(self.to_string())])
    }
}

/// Convert driver errors to MongoMcpError.
///
/// Command errors keep the server's code and code name; everything else
/// (network, auth, server selection, ...) is reported with the driver's text.
impl From<mongodb::error::Error> for MongoMcpError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            mongodb::error::ErrorKind::Command(command_error) => Self::Execution {
                message: format!(
                    "{} ({}): {}",
                    command_error.code_name, command_error.code, command_error.message
                ),
                code: Some(command_error.code),
                code_name: Some(command_error.code_name.clone()),
            },
            _ => Self::execution(err.to_string()),
        }
    }
}

/// Result type alias for server operations.
pub type MongoMcpResult<T> = Result<T, MongoMcpError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_text(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.clone()))
            .collect::<Vec<_>>()
            .join("")
    }

    #[test]
    fn test_error_display() {
        let err = MongoMcpError::connectivity("ping timed out", "Check that mongod is running");
        assert!(err.to_string().contains("Connection failed"));
        assert_eq!(err.suggestion(), Some("Check that mongod is running"));
    }

    #[test]
    fn test_server_code_only_for_command_errors() {
        let err = MongoMcpError::Execution {
            message: "CommandNotFound (59): no such command".to_string(),
            code: Some(59),
            code_name: Some("CommandNotFound".to_string()),
        };
        assert_eq!(err.server_code(), Some((59, "CommandNotFound")));
        assert_eq!(MongoMcpError::cancelled().server_code(), None);
        assert_eq!(MongoMcpError::parse("bad").server_code(), None);
    }

    #[test]
    fn test_cancelled_is_execution_error() {
        let err = MongoMcpError::cancelled();
        assert!(matches!(err, MongoMcpError::Execution { .. }));
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn test_timed_out_mentions_duration() {
        let err = MongoMcpError::timed_out(Duration::from_secs(30));
        assert!(matches!(err, MongoMcpError::Execution { .. }));
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn test_into_tool_result_is_error() {
        let result = MongoMcpError::parse("expected value at line 1").into_tool_result();
        assert_eq!(result.is_error, Some(true));
        assert!(tool_text(&result).contains("Failed to parse command JSON"));
    }
}
