//! Database access layer.
//!
//! This module provides:
//! - The process-lifetime MongoDB connection
//! - The command execution seam used by the command tool

pub mod connection;
pub mod executor;

pub use connection::MongoConnection;
pub use executor::CommandExecutor;
