// File: src/services/discord/handlers/slash.rs

use async_trait::async_trait;
use tracing::{debug, info};

use crate::Error;
use crate::models::{CommandKind, InteractionEvent, InteractionKind, OutgoingMessage};
use crate::services::discord::executor::{CommandExecutor, Invocation};
use crate::services::discord::handlers::{COMMAND_UNAVAILABLE_MESSAGE, InteractionHandler};
use crate::services::discord::template::bind_options;

pub struct SlashCommandHandler {
    executor: CommandExecutor,
}

impl SlashCommandHandler {
    pub fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl InteractionHandler for SlashCommandHandler {
    fn id(&self) -> &str {
        "discord.slash_command"
    }

    async fn handle(&self, event: &InteractionEvent) -> Result<(), Error> {
        let InteractionKind::SlashCommand { command_name, options } = &event.kind else {
            return Ok(());
        };
        let session = self.executor.session();

        let command = session
            .commands
            .get_command_by_name(&session.bot_id, command_name)
            .await?
            .filter(|c| c.is_active && matches!(c.kind, CommandKind::Slash | CommandKind::Modal));
        let Some(command) = command else {
            debug!("no active slash command named '{command_name}'");
            let notice = OutgoingMessage::text(COMMAND_UNAVAILABLE_MESSAGE).ephemeral(true);
            session.client.reply(&event.interaction, notice).await?;
            return Ok(());
        };

        let params = bind_options(&command.options, options);

        if command.kind == CommandKind::Modal {
            if !self.executor.authorize(event, &command, &params).await {
                return Ok(());
            }
            let Some(modal) = &command.modal else {
                return Err(Error::Validation(format!("modal command /{} has no modal", command.name)));
            };
            info!("showing modal '{}' for /{}", modal.custom_id, command.name);
            session.client.show_modal(&event.interaction, modal).await?;
            return Ok(());
        }

        self.executor.run(Invocation::new(event, &command, params), true).await;
        Ok(())
    }
}
