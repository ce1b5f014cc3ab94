//! MongoDB MCP Server Library
//!
//! This library exposes a single MCP (Model Context Protocol) tool that runs an
//! arbitrary MongoDB database command, given as Extended JSON, against a configured
//! database and returns the reply as Extended JSON.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::MongoMcpError;
pub use mcp::MongoService;
