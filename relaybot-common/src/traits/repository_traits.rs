use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Command, CommandLog, Server};

/// Command definitions, keyed by bot identity and command name.
///
/// The management API is the only writer; the dispatcher reads definitions and
/// bumps `usage_count` through `increment_usage`.
#[async_trait]
pub trait CommandRepository: Send + Sync {
    async fn create_command(&self, cmd: &Command) -> Result<(), Error>;
    async fn get_command_by_id(&self, command_id: Uuid) -> Result<Option<Command>, Error>;
    /// Name comparison is case-insensitive.
    async fn get_command_by_name(&self, bot_id: &str, name: &str) -> Result<Option<Command>, Error>;
    async fn list_commands(&self, bot_id: &str) -> Result<Vec<Command>, Error>;
    async fn update_command(&self, cmd: &Command) -> Result<(), Error>;
    async fn delete_command(&self, command_id: Uuid) -> Result<(), Error>;
    /// Atomic `usage_count + 1` at the storage layer.
    async fn increment_usage(&self, bot_id: &str, name: &str) -> Result<(), Error>;
}

#[async_trait]
pub trait ServerRepository: Send + Sync {
    async fn get_server_by_server_id(&self, server_id: &str) -> Result<Option<Server>, Error>;
    async fn upsert_server(&self, server: &Server) -> Result<(), Error>;
    async fn list_servers(&self) -> Result<Vec<Server>, Error>;
}

/// Append-only audit store.
#[async_trait]
pub trait CommandLogRepository: Send + Sync {
    async fn create_command_log(&self, entry: &CommandLog) -> Result<(), Error>;
    async fn list_logs_for_bot(&self, bot_id: &str, limit: i64) -> Result<Vec<CommandLog>, Error>;
}
