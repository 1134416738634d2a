// File: src/services/audit_log.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use relaybot_common::traits::repository_traits::CommandLogRepository;

use crate::models::{CallbackOutcome, CommandLog, IncomingMessage, InteractionEvent, LogStatus};

/// Who/where an outcome happened, as stored on the log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSubject {
    pub server_id: Option<String>,
    pub server_name: Option<String>,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub user_id: String,
    pub user_name: String,
}

impl From<&InteractionEvent> for LogSubject {
    fn from(event: &InteractionEvent) -> Self {
        Self {
            server_id: event.guild.as_ref().map(|g| g.id.clone()),
            server_name: event.guild.as_ref().map(|g| g.name.clone()),
            channel_id: event.channel.as_ref().map(|c| c.id.clone()),
            channel_name: event.channel.as_ref().and_then(|c| c.name.clone()),
            user_id: event.user.id.clone(),
            user_name: event.user.username.clone(),
        }
    }
}

impl From<&IncomingMessage> for LogSubject {
    fn from(msg: &IncomingMessage) -> Self {
        Self {
            server_id: msg.guild.as_ref().map(|g| g.id.clone()),
            server_name: msg.guild.as_ref().map(|g| g.name.clone()),
            channel_id: Some(msg.channel.id.clone()),
            channel_name: msg.channel.name.clone(),
            user_id: msg.author.id.clone(),
            user_name: msg.author.username.clone(),
        }
    }
}

/// Append-only writer of `CommandLog` entries. Store failures are logged and
/// swallowed so an audit hiccup never changes what the user saw.
#[derive(Clone)]
pub struct AuditLogger {
    repo: Arc<dyn CommandLogRepository>,
    bot_id: String,
}

impl AuditLogger {
    pub fn new(repo: Arc<dyn CommandLogRepository>, bot_id: &str) -> Self {
        Self {
            repo,
            bot_id: bot_id.to_string(),
        }
    }

    pub async fn success(
        &self,
        subject: &LogSubject,
        command: &str,
        parameters: Map<String, Value>,
        callback: Option<CallbackOutcome>,
    ) {
        let mut entry = self.entry(subject, command, LogStatus::Success, parameters);
        entry.callback = callback;
        self.record(entry).await;
    }

    pub async fn failure(
        &self,
        subject: &LogSubject,
        command: &str,
        parameters: Map<String, Value>,
        error: String,
    ) {
        let mut entry = self.entry(subject, command, LogStatus::Error, parameters);
        entry.error_message = Some(error);
        self.record(entry).await;
    }

    pub async fn permission_denied(
        &self,
        subject: &LogSubject,
        command: &str,
        parameters: Map<String, Value>,
    ) {
        let entry = self.entry(subject, command, LogStatus::PermissionDenied, parameters);
        self.record(entry).await;
    }

    fn entry(
        &self,
        subject: &LogSubject,
        command: &str,
        status: LogStatus,
        parameters: Map<String, Value>,
    ) -> CommandLog {
        CommandLog {
            log_id: Uuid::new_v4(),
            bot_id: self.bot_id.clone(),
            server_id: subject.server_id.clone(),
            server_name: subject.server_name.clone(),
            channel_id: subject.channel_id.clone(),
            channel_name: subject.channel_name.clone(),
            user_id: subject.user_id.clone(),
            user_name: subject.user_name.clone(),
            command_name: command.to_string(),
            status,
            timestamp: Utc::now(),
            parameters,
            error_message: None,
            callback: None,
        }
    }

    async fn record(&self, entry: CommandLog) {
        if let Err(e) = self.repo.create_command_log(&entry).await {
            warn!(
                "failed to write {} log for '{}': {e}",
                entry.status.as_str(),
                entry.command_name
            );
        }
    }
}
