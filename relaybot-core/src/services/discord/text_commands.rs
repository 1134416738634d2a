// File: src/services/discord/text_commands.rs

use serde_json::Map;
use tracing::{debug, info, warn};

use crate::Error;
use crate::models::{Command, IncomingMessage, OutgoingMessage};
use crate::services::audit_log::LogSubject;
use crate::services::discord::executor::{CommandExecutor, GENERIC_FAILURE_MESSAGE, response_message};
use crate::services::discord::permissions::{PERMISSION_DENIED_MESSAGE, is_allowed};
use crate::services::discord::template::{TemplateContext, TemplateMode, render};
use crate::services::webhook::WebhookPayload;

/// Runs `text` and `embed` commands invoked as `<prefix><name>` chat messages.
pub struct TextCommandHandler {
    executor: CommandExecutor,
}

impl TextCommandHandler {
    pub fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }

    /// Returns whether the message named a command and was acted on.
    pub async fn handle_message(&self, msg: &IncomingMessage) -> Result<bool, Error> {
        if msg.author_is_bot {
            return Ok(false);
        }
        let session = self.executor.session();
        let Some(name) = parse_invocation(&msg.content, &session.settings.text_command_prefix) else {
            return Ok(false);
        };

        let command = session
            .commands
            .get_command_by_name(&session.bot_id, name)
            .await?
            .filter(|c| c.is_active && c.kind.is_message_command());
        let Some(command) = command else {
            return Ok(false);
        };

        if let Some(guild) = &msg.guild {
            match session.servers.get_server_by_server_id(&guild.id).await {
                Ok(Some(server)) if !server.enabled => {
                    debug!("guild {} is disabled; ignoring !{}", guild.id, command.name);
                    return Ok(false);
                }
                Ok(_) => {}
                Err(e) => warn!("could not read server record for {}: {e}", guild.id),
            }
        }

        let subject = LogSubject::from(msg);
        let permissions = msg
            .guild
            .as_ref()
            .map(|g| session.guilds.member_permissions(&g.id, &msg.author.id))
            .unwrap_or_default();
        let is_owner = msg
            .guild
            .as_ref()
            .and_then(|g| g.owner_id.as_deref())
            .is_some_and(|owner| owner == msg.author.id);

        if !is_allowed(command.required_permission, permissions, is_owner) {
            info!("user {} denied !{}", msg.author.id, command.name);
            let notice = OutgoingMessage::text(PERMISSION_DENIED_MESSAGE);
            if let Err(e) = session.client.send_channel_message(&msg.channel.id, notice).await {
                debug!("could not deliver permission denial: {e}");
            }
            self.executor
                .audit()
                .permission_denied(&subject, &command.name, Map::new())
                .await;
            return Ok(true);
        }

        if let Err(e) = self.execute(msg, &command, &subject).await {
            warn!("!{} failed for {}: {e}", command.name, msg.author.id);
            let notice = OutgoingMessage::text(GENERIC_FAILURE_MESSAGE);
            if let Err(e) = session.client.send_channel_message(&msg.channel.id, notice).await {
                debug!("could not deliver failure notice: {e}");
            }
            self.executor
                .audit()
                .failure(&subject, &command.name, Map::new(), e.to_string())
                .await;
        }
        Ok(true)
    }

    async fn execute(&self, msg: &IncomingMessage, command: &Command, subject: &LogSubject) -> Result<(), Error> {
        let session = self.executor.session();
        let client = session.client.as_ref();
        let server = msg.guild.as_ref().map_or("DM", |g| g.name.as_str());

        let body = render(
            &command.response,
            &TemplateContext {
                mode: TemplateMode::Response {
                    ping: session.latency_ms(),
                },
                params: &[],
                user: &msg.author.username,
                server,
                extras: &[],
            },
        );
        client
            .send_channel_message(&msg.channel.id, response_message(command.kind, body))
            .await?;

        if command.delete_user_message {
            if let Err(e) = client.delete_message(&msg.channel.id, &msg.message_id).await {
                debug!("could not delete invoking message {}: {e}", msg.message_id);
            }
        }

        session.commands.increment_usage(&session.bot_id, &command.name).await?;

        let callback = match command.webhook_target() {
            Some(url) => {
                let payload = WebhookPayload::new(
                    &command.name,
                    &session.bot_id,
                    &msg.author,
                    msg.guild.as_ref(),
                    Some(&msg.channel),
                )
                .with_parameters(Map::new());
                let outcome = self.executor.notifier().notify(url, &payload).await;
                if !outcome.is_success() {
                    if let Some(text) = command.webhook_failure_message.as_deref().filter(|t| !t.is_empty()) {
                        if let Err(e) = client.send_channel_message(&msg.channel.id, OutgoingMessage::text(text)).await {
                            debug!("could not deliver webhook failure notice: {e}");
                        }
                    }
                }
                Some(outcome)
            }
            None => None,
        };

        if command.log_usage {
            self.executor
                .audit()
                .success(subject, &command.name, Map::new(), callback)
                .await;
        }
        info!("!{} executed for {} in {server}", command.name, msg.author.id);
        Ok(())
    }
}

/// Command name of a prefixed message, if it is one.
pub fn parse_invocation<'a>(content: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    let rest = content.trim_start().strip_prefix(prefix)?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    rest.split_whitespace().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_first_word() {
        assert_eq!(parse_invocation("!rules please", "!"), Some("rules"));
        assert_eq!(parse_invocation("  !rules", "!"), Some("rules"));
        assert_eq!(parse_invocation("?? help", "??"), None);
        assert_eq!(parse_invocation("??help", "??"), Some("help"));
        assert_eq!(parse_invocation("rules", "!"), None);
        assert_eq!(parse_invocation("!", "!"), None);
        assert_eq!(parse_invocation("! rules", "!"), None);
    }
}
