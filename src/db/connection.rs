//! MongoDB connection management.
//!
//! A single [`MongoConnection`] is opened at startup, checked with a bounded ping,
//! shared read-only by every tool call (the driver pools sockets internally) and
//! shut down explicitly by the transport when the server stops.

use crate::config::MongoSettings;
use crate::db::executor::CommandExecutor;
use crate::error::{MongoMcpError, MongoMcpResult};
use mongodb::bson::{Document, doc};
use mongodb::options::{ClientOptions, ReadPreference, SelectionCriteria};
use mongodb::{Client, Database};
use std::future::IntoFuture;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Shared handle to the configured MongoDB database.
#[derive(Debug, Clone)]
pub struct MongoConnection {
    client: Client,
    database: Database,
    settings: MongoSettings,
}

impl MongoConnection {
    /// Build the client without contacting the server.
    ///
    /// The driver connects lazily, so this only fails for malformed URIs or options.
    pub async fn open(settings: &MongoSettings) -> MongoMcpResult<Self> {
        let mut options = ClientOptions::parse(settings.uri.as_str())
            .await
            .map_err(|e| {
                MongoMcpError::connectivity(
                    format!("Invalid MongoDB URI {}: {}", settings.redacted_uri(), e),
                    "Check the connection string format and options",
                )
            })?;

        if options.app_name.is_none() {
            options.app_name = Some(settings.app_name.clone());
        }

        let client = Client::with_options(options).map_err(|e| {
            MongoMcpError::connectivity(
                format!("Failed to create MongoDB client: {}", e),
                "Check the connection string options",
            )
        })?;
        let database = client.database(&settings.database);

        Ok(Self {
            client,
            database,
            settings: settings.clone(),
        })
    }

    /// Open the client and verify the primary is reachable.
    pub async fn connect(settings: &MongoSettings) -> MongoMcpResult<Self> {
        info!(
            uri = %settings.redacted_uri(),
            database = %settings.database,
            timeout_ms = settings.ping_timeout.as_millis() as u64,
            "Connecting to MongoDB"
        );

        let connection = Self::open(settings).await?;
        connection.ping(settings.ping_timeout).await?;

        let server_version = connection.server_version().await;
        info!(
            database = %settings.database,
            server_version = ?server_version,
            "Connected successfully"
        );
        Ok(connection)
    }

    /// Run `{ping: 1}` against the primary, bounded by `limit`.
    pub async fn ping(&self, limit: Duration) -> MongoMcpResult<()> {
        let admin = self.client.database("admin");
        let ping = admin
            .run_command(doc! { "ping": 1 })
            .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary));

        match timeout(limit, ping.into_future()).await {
            Ok(Ok(_)) => {
                debug!("Ping succeeded");
                Ok(())
            }
            Ok(Err(e)) => Err(MongoMcpError::connectivity(
                format!("Ping to {} failed: {}", self.settings.redacted_uri(), e),
                "Check that the server is running and the credentials are valid",
            )),
            Err(_) => Err(MongoMcpError::connectivity(
                format!(
                    "Ping to {} timed out after {}ms",
                    self.settings.redacted_uri(),
                    limit.as_millis()
                ),
                "Check network connectivity and that a primary is available",
            )),
        }
    }

    /// Best-effort server version from `buildInfo`.
    pub async fn server_version(&self) -> Option<String> {
        match self.database.run_command(doc! { "buildInfo": 1 }).await {
            Ok(reply) => reply.get_str("version").ok().map(String::from),
            Err(e) => {
                warn!(error = %e, "Failed to query server version");
                None
            }
        }
    }

    /// The settings this connection was opened with.
    pub fn settings(&self) -> &MongoSettings {
        &self.settings
    }

    /// Shut down the client, waiting for in-use sessions and cursors to be returned.
    pub async fn close(&self) {
        info!(database = %self.settings.database, "Closing MongoDB connection");
        self.client.clone().shutdown().await;
    }
}

impl CommandExecutor for MongoConnection {
    async fn run_command(&self, command: Document) -> MongoMcpResult<Document> {
        self.database
            .run_command(command)
            .await
            .map_err(MongoMcpError::from)
    }

    fn database_name(&self) -> &str {
        self.database.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_open_is_lazy() {
        // Nothing listens on this port; open must still succeed.
        let settings = Config::default_config("mongodb://127.0.0.1:1", "app").mongo_settings();
        let connection = MongoConnection::open(&settings).await.unwrap();
        assert_eq!(connection.database_name(), "app");
        assert_eq!(connection.settings().app_name, "mongo-mcp-server");
    }

    #[tokio::test]
    async fn test_open_rejects_malformed_uri() {
        let settings = Config::default_config("mongodb://", "app").mongo_settings();
        let err = MongoConnection::open(&settings).await.unwrap_err();
        assert!(matches!(err, MongoMcpError::Connectivity { .. }));
    }

    #[tokio::test]
    async fn test_ping_times_out_against_unreachable_server() {
        let mut config = Config::default_config(
            "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=60000",
            "app",
        );
        config.ping_timeout = 1;
        let settings = config.mongo_settings();
        let connection = MongoConnection::open(&settings).await.unwrap();

        let err = connection
            .ping(Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, MongoMcpError::Connectivity { .. }));
        assert!(err.to_string().contains("timed out after 200ms"), "{err}");
        assert!(err.suggestion().is_some());
    }
}
