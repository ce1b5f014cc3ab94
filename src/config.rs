//! Configuration handling for the MongoDB MCP Server.
//!
//! This module provides configuration management via CLI arguments and environment variables.
//! Everything is read once at startup into [`Config`], which is then passed by value or
//! reference into the components that need it.

use crate::error::{MongoMcpError, MongoMcpResult};
use clap::{Parser, ValueEnum};
use std::time::Duration;

pub const DEFAULT_SERVER_PORT: u16 = 26275;
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_MCP_ENDPOINT: &str = "/";
pub const DEFAULT_PING_TIMEOUT_SECS: u64 = 2;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_APP_NAME: &str = "mongo-mcp-server";

/// Characters MongoDB does not allow in database names.
const FORBIDDEN_DB_NAME_CHARS: &[char] = &['/', '\\', '.', ' ', '"', '$', '\0'];
const MAX_DB_NAME_BYTES: usize = 63;

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Extended JSON flavour used when rendering command replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExtJsonMode {
    /// Plain JSON numbers and ISO dates where lossless enough; easier to read
    #[default]
    Relaxed,
    /// Every non-JSON type wrapped in its `$type` tag; fully type preserving
    Canonical,
}

impl std::fmt::Display for ExtJsonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Relaxed => write!(f, "relaxed"),
            Self::Canonical => write!(f, "canonical"),
        }
    }
}

/// Settings needed to open the MongoDB connection.
#[derive(Clone)]
pub struct MongoSettings {
    /// Full connection URI (sensitive - use `redacted_uri` for logging).
    pub uri: String,
    pub database: String,
    pub app_name: String,
    /// Upper bound for the startup connectivity check.
    pub ping_timeout: Duration,
}

impl MongoSettings {
    /// The URI with any `user:password@` section masked.
    pub fn redacted_uri(&self) -> String {
        redact_uri(&self.uri)
    }
}

impl std::fmt::Debug for MongoSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoSettings")
            .field("uri", &self.redacted_uri())
            .field("database", &self.database)
            .field("app_name", &self.app_name)
            .field("ping_timeout", &self.ping_timeout)
            .finish()
    }
}

/// Mask credentials in a MongoDB connection string.
///
/// Works on the raw string since seed lists (`host1,host2`) are not valid URLs.
pub fn redact_uri(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://") else {
        return uri.to_string();
    };
    let rest = &uri[scheme_end + 3..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}://***@{}", &uri[..scheme_end], &rest[at + 1..]),
        None => uri.to_string(),
    }
}

/// Configuration for the MongoDB MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mongo-mcp-server",
    about = "MCP server for MongoDB - lets AI assistants run database commands",
    version,
    author
)]
pub struct Config {
    /// MongoDB connection string (mongodb:// or mongodb+srv://)
    #[arg(long, value_name = "URI", env = "MCPMONGO_MONGO_URI", hide_env_values = true)]
    pub mongo_uri: String,

    /// Database that commands are run against
    #[arg(long, value_name = "NAME", env = "MCPMONGO_DATABASE_NAME")]
    pub database_name: String,

    /// Port to listen on (used by the http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_SERVER_PORT,
        env = "MCPMONGO_SERVER_PORT"
    )]
    pub server_port: u16,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCPMONGO_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCPMONGO_HTTP_HOST"
    )]
    pub http_host: String,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCPMONGO_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Startup connectivity check timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_PING_TIMEOUT_SECS,
        env = "MCPMONGO_PING_TIMEOUT"
    )]
    pub ping_timeout: u64,

    /// Per-command timeout in seconds (0 disables the server-side limit)
    #[arg(
        long,
        default_value_t = DEFAULT_COMMAND_TIMEOUT_SECS,
        env = "MCPMONGO_COMMAND_TIMEOUT"
    )]
    pub command_timeout: u64,

    /// Extended JSON mode for command replies
    #[arg(
        long,
        value_enum,
        default_value = "relaxed",
        env = "MCPMONGO_EXTJSON_MODE"
    )]
    pub extjson_mode: ExtJsonMode,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCPMONGO_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCPMONGO_JSON_LOGS")]
    pub json_logs: bool,

    /// Authentication tokens for HTTP transport.
    /// Can be specified multiple times or as comma-separated values.
    /// When set, all HTTP requests must include a valid Bearer token.
    #[arg(
        long = "auth-token",
        value_name = "TOKEN",
        env = "MCPMONGO_AUTH_TOKENS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub auth_tokens: Vec<String>,
}

impl Config {
    /// Create a configuration with defaults for everything but the connection (useful for testing).
    pub fn default_config(mongo_uri: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            mongo_uri: mongo_uri.into(),
            database_name: database_name.into(),
            server_port: DEFAULT_SERVER_PORT,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            ping_timeout: DEFAULT_PING_TIMEOUT_SECS,
            command_timeout: DEFAULT_COMMAND_TIMEOUT_SECS,
            extjson_mode: ExtJsonMode::Relaxed,
            log_level: "info".to_string(),
            json_logs: false,
            auth_tokens: Vec::new(),
        }
    }

    /// Check the values clap cannot check on its own.
    pub fn validate(&self) -> MongoMcpResult<()> {
        let uri = self.mongo_uri.trim();
        if uri.is_empty() {
            return Err(MongoMcpError::configuration(
                "MCPMONGO_MONGO_URI is not set",
            ));
        }
        if !(uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://")) {
            return Err(MongoMcpError::configuration(format!(
                "MongoDB URI must start with mongodb:// or mongodb+srv:// (got {})",
                redact_uri(uri)
            )));
        }

        validate_database_name(&self.database_name)?;

        if self.ping_timeout == 0 {
            return Err(MongoMcpError::configuration(
                "ping timeout must be greater than 0",
            ));
        }
        if !self.mcp_endpoint.starts_with('/') {
            return Err(MongoMcpError::configuration(format!(
                "MCP endpoint must start with '/' (got {})",
                self.mcp_endpoint
            )));
        }
        Ok(())
    }

    /// Build the connection settings handed to the connection manager.
    pub fn mongo_settings(&self) -> MongoSettings {
        MongoSettings {
            uri: self.mongo_uri.trim().to_string(),
            database: self.database_name.trim().to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            ping_timeout: self.ping_timeout_duration(),
        }
    }

    /// Get the ping timeout as a Duration.
    pub fn ping_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.ping_timeout)
    }

    /// Get the command timeout as a Duration, `None` when disabled.
    pub fn command_timeout_duration(&self) -> Option<Duration> {
        (self.command_timeout > 0).then(|| Duration::from_secs(self.command_timeout))
    }
}

fn validate_database_name(name: &str) -> MongoMcpResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(MongoMcpError::configuration(
            "MCPMONGO_DATABASE_NAME is not set",
        ));
    }
    if name.len() > MAX_DB_NAME_BYTES {
        return Err(MongoMcpError::configuration(format!(
            "database name '{}' exceeds {} bytes",
            name, MAX_DB_NAME_BYTES
        )));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_DB_NAME_CHARS.contains(c)) {
        return Err(MongoMcpError::configuration(format!(
            "database name '{}' contains forbidden character {:?}",
            name, c
        )));
    }
    Ok(())
}
