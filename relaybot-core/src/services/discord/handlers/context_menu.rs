// File: src/services/discord/handlers/context_menu.rs

use async_trait::async_trait;
use tracing::debug;

use crate::Error;
use crate::models::{CommandKind, InteractionEvent, InteractionKind, OutgoingMessage};
use crate::services::discord::executor::{CommandExecutor, Invocation};
use crate::services::discord::handlers::{COMMAND_UNAVAILABLE_MESSAGE, InteractionHandler};

/// Right-click user/message actions. These carry no options; the target is
/// exposed as `{target}`. No permission gate is applied here.
pub struct ContextMenuHandler {
    executor: CommandExecutor,
}

impl ContextMenuHandler {
    pub fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl InteractionHandler for ContextMenuHandler {
    fn id(&self) -> &str {
        "discord.context_menu"
    }

    async fn handle(&self, event: &InteractionEvent) -> Result<(), Error> {
        let InteractionKind::ContextMenu { command_name, target } = &event.kind else {
            return Ok(());
        };
        let session = self.executor.session();

        let command = session
            .commands
            .get_command_by_name(&session.bot_id, command_name)
            .await?
            .filter(|c| c.is_active && c.kind == CommandKind::ContextMenu);
        let Some(command) = command else {
            debug!("no active context-menu command named '{command_name}'");
            let notice = OutgoingMessage::text(COMMAND_UNAVAILABLE_MESSAGE).ephemeral(true);
            session.client.reply(&event.interaction, notice).await?;
            return Ok(());
        };

        let invocation = Invocation::new(event, &command, Vec::new()).with_target(target.clone());
        self.executor.run(invocation, false).await;
        Ok(())
    }
}
