// File: src/services/command_service.rs
//
// The management-side surface over command definitions: validation,
// per-bot name uniqueness, persistence, and re-registration with the
// platform whenever a registrable command is touched.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::Error;
use crate::context::BotSession;
use crate::models::{Command, CommandLog, Server};
use crate::services::discord::registrar::{CommandRegistrar, ReloadReport};

/// What happened to the platform registration after a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResyncStatus {
    /// No registrable command was affected.
    NotNeeded,
    Synced(ReloadReport),
    /// The write is kept; the platform set is stale until the next reload.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct CommandChange {
    pub command: Command,
    pub resync: ResyncStatus,
}

pub struct CommandService {
    session: Arc<BotSession>,
    registrar: CommandRegistrar,
}

impl CommandService {
    pub fn new(session: Arc<BotSession>) -> Self {
        debug!("Initializing CommandService for bot {}", session.bot_id);
        let registrar = CommandRegistrar::new(session.clone());
        Self { session, registrar }
    }

    pub async fn list_commands(&self) -> Result<Vec<Command>, Error> {
        let mut commands = self.session.commands.list_commands(&self.session.bot_id).await?;
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(commands)
    }

    pub async fn get_command(&self, command_id: Uuid) -> Result<Command, Error> {
        self.session
            .commands
            .get_command_by_id(command_id)
            .await?
            .filter(|c| c.bot_id == self.session.bot_id)
            .ok_or_else(|| Error::NotFound(format!("command {command_id}")))
    }

    pub async fn create_command(&self, mut cmd: Command) -> Result<CommandChange, Error> {
        cmd.bot_id = self.session.bot_id.clone();
        cmd.name = cmd.name.trim().to_lowercase();
        cmd.validate()?;
        self.ensure_name_free(&cmd.name, None).await?;

        let now = Utc::now();
        cmd.usage_count = 0;
        cmd.created_at = now;
        cmd.updated_at = now;
        self.session.commands.create_command(&cmd).await?;
        info!("created {} command '{}' ({})", cmd.kind, cmd.name, cmd.command_id);

        let resync = self.resync(cmd.is_registrable()).await;
        Ok(CommandChange { command: cmd, resync })
    }

    pub async fn update_command(&self, mut cmd: Command) -> Result<CommandChange, Error> {
        let existing = self.get_command(cmd.command_id).await?;

        cmd.bot_id = existing.bot_id.clone();
        cmd.name = cmd.name.trim().to_lowercase();
        cmd.validate()?;
        if !cmd.name.eq_ignore_ascii_case(&existing.name) {
            self.ensure_name_free(&cmd.name, Some(cmd.command_id)).await?;
        }

        // usage_count belongs to the dispatcher.
        cmd.usage_count = existing.usage_count;
        cmd.created_at = existing.created_at;
        cmd.updated_at = Utc::now();
        self.session.commands.update_command(&cmd).await?;
        info!("updated command '{}' ({})", cmd.name, cmd.command_id);

        let resync = self
            .resync(existing.is_registrable() || cmd.is_registrable())
            .await;
        Ok(CommandChange { command: cmd, resync })
    }

    pub async fn delete_command(&self, command_id: Uuid) -> Result<CommandChange, Error> {
        let existing = self.get_command(command_id).await?;
        self.session.commands.delete_command(command_id).await?;
        info!("deleted command '{}' ({})", existing.name, command_id);

        let resync = self.resync(existing.is_registrable()).await;
        Ok(CommandChange { command: existing, resync })
    }

    /// Manual full re-registration.
    pub async fn reload_commands(&self) -> Result<ReloadReport, Error> {
        self.registrar.sync().await
    }

    pub async fn set_server_enabled(&self, server_id: &str, enabled: bool) -> Result<Server, Error> {
        let mut server = self
            .session
            .servers
            .get_server_by_server_id(server_id)
            .await?
            .unwrap_or_else(|| Server::new(server_id, enabled));
        server.enabled = enabled;
        server.updated_at = Utc::now();
        if let Some(guild) = self.session.guilds.guild(server_id) {
            server.name = Some(guild.name);
            server.member_count = guild.member_count.and_then(|n| i64::try_from(n).ok());
        }
        self.session.servers.upsert_server(&server).await?;
        info!("server {server_id} {}", if enabled { "enabled" } else { "disabled" });
        Ok(server)
    }

    pub async fn recent_logs(&self, limit: i64) -> Result<Vec<CommandLog>, Error> {
        self.session.logs.list_logs_for_bot(&self.session.bot_id, limit).await
    }

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<(), Error> {
        let clash = self
            .session
            .commands
            .get_command_by_name(&self.session.bot_id, name)
            .await?
            .filter(|other| Some(other.command_id) != except);
        match clash {
            Some(_) => Err(Error::Conflict(format!("a command named '{name}' already exists"))),
            None => Ok(()),
        }
    }

    async fn resync(&self, needed: bool) -> ResyncStatus {
        if !needed {
            return ResyncStatus::NotNeeded;
        }
        match self.registrar.sync().await {
            Ok(report) => ResyncStatus::Synced(report),
            Err(e) => {
                error!("command registration failed after write: {e}");
                ResyncStatus::Failed(e.to_string())
            }
        }
    }
}
