//! Command execution seam.
//!
//! The command tool talks to the database only through [`CommandExecutor`], which
//! [`MongoConnection`](crate::db::MongoConnection) implements on top of the driver's
//! generic `runCommand`. Implementations must be safe to share across concurrent
//! tool calls without external locking.

use crate::error::MongoMcpResult;
use mongodb::bson::Document;
use std::future::Future;

/// Runs a generic database command and returns the server's reply document.
pub trait CommandExecutor: Send + Sync + 'static {
    /// Submit `command` verbatim. Key order of the document is preserved.
    ///
    /// Dropping the returned future abandons the command; callers rely on this
    /// for cancellation and timeouts.
    fn run_command(
        &self,
        command: Document,
    ) -> impl Future<Output = MongoMcpResult<Document>> + Send;

    /// Name of the database commands are run against.
    fn database_name(&self) -> &str;
}
