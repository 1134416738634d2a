// File: relaybot-core/src/repositories/memory.rs
//
// Process-local repositories for `--in-memory` mode and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use relaybot_common::error::Error;
use relaybot_common::models::{Command, CommandLog, Server};
use relaybot_common::traits::repository_traits::{
    CommandLogRepository, CommandRepository, ServerRepository,
};

#[derive(Default)]
pub struct InMemoryCommandRepository {
    commands: DashMap<Uuid, Command>,
}

impl InMemoryCommandRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_id(&self, bot_id: &str, name: &str) -> Option<Uuid> {
        self.commands
            .iter()
            .find(|entry| entry.bot_id == bot_id && entry.name.eq_ignore_ascii_case(name))
            .map(|entry| *entry.key())
    }
}

#[async_trait]
impl CommandRepository for InMemoryCommandRepository {
    async fn create_command(&self, cmd: &Command) -> Result<(), Error> {
        if self.find_id(&cmd.bot_id, &cmd.name).is_some() {
            return Err(Error::Conflict(format!("command '{}' already exists", cmd.name)));
        }
        self.commands.insert(cmd.command_id, cmd.clone());
        Ok(())
    }

    async fn get_command_by_id(&self, command_id: Uuid) -> Result<Option<Command>, Error> {
        Ok(self.commands.get(&command_id).map(|c| c.clone()))
    }

    async fn get_command_by_name(&self, bot_id: &str, name: &str) -> Result<Option<Command>, Error> {
        Ok(self
            .find_id(bot_id, name)
            .and_then(|id| self.commands.get(&id).map(|c| c.clone())))
    }

    async fn list_commands(&self, bot_id: &str) -> Result<Vec<Command>, Error> {
        let mut out: Vec<Command> = self
            .commands
            .iter()
            .filter(|c| c.bot_id == bot_id)
            .map(|c| c.clone())
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn update_command(&self, cmd: &Command) -> Result<(), Error> {
        let mut entry = self
            .commands
            .get_mut(&cmd.command_id)
            .ok_or_else(|| Error::NotFound(format!("command {}", cmd.command_id)))?;
        let usage_count = entry.usage_count;
        *entry = cmd.clone();
        entry.usage_count = usage_count;
        Ok(())
    }

    async fn delete_command(&self, command_id: Uuid) -> Result<(), Error> {
        self.commands.remove(&command_id);
        Ok(())
    }

    async fn increment_usage(&self, bot_id: &str, name: &str) -> Result<(), Error> {
        let id = self
            .find_id(bot_id, name)
            .ok_or_else(|| Error::NotFound(format!("command '{name}' for bot {bot_id}")))?;
        // get_mut holds the shard write lock, so concurrent increments serialize.
        if let Some(mut entry) = self.commands.get_mut(&id) {
            entry.usage_count += 1;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryServerRepository {
    servers: DashMap<String, Server>,
}

impl InMemoryServerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServerRepository for InMemoryServerRepository {
    async fn get_server_by_server_id(&self, server_id: &str) -> Result<Option<Server>, Error> {
        Ok(self.servers.get(server_id).map(|s| s.clone()))
    }

    async fn upsert_server(&self, server: &Server) -> Result<(), Error> {
        self.servers.insert(server.server_id.clone(), server.clone());
        Ok(())
    }

    async fn list_servers(&self) -> Result<Vec<Server>, Error> {
        let mut out: Vec<Server> = self.servers.iter().map(|s| s.clone()).collect();
        out.sort_by(|a, b| a.server_id.cmp(&b.server_id));
        Ok(out)
    }
}

#[derive(Default)]
pub struct InMemoryCommandLogRepository {
    logs: RwLock<Vec<CommandLog>>,
}

impl InMemoryCommandLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry in insertion order.
    pub async fn all(&self) -> Vec<CommandLog> {
        self.logs.read().await.clone()
    }
}

#[async_trait]
impl CommandLogRepository for InMemoryCommandLogRepository {
    async fn create_command_log(&self, entry: &CommandLog) -> Result<(), Error> {
        self.logs.write().await.push(entry.clone());
        Ok(())
    }

    async fn list_logs_for_bot(&self, bot_id: &str, limit: i64) -> Result<Vec<CommandLog>, Error> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let logs = self.logs.read().await;
        // Newest insert first so equal timestamps still come back newest first.
        let mut out: Vec<CommandLog> = logs.iter().rev().filter(|l| l.bot_id == bot_id).cloned().collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out.truncate(limit);
        Ok(out)
    }
}
