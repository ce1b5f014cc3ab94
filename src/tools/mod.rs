//! MCP tool implementations.
//!
//! - `command`: the `execute_mongo_command` tool handler
//! - `extjson`: Extended JSON translation of commands and replies

pub mod command;
pub mod extjson;

pub use command::{CommandInput, CommandToolHandler};
pub use extjson::{parse_command, render_reply};
