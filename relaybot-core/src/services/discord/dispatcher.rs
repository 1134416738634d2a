// File: src/services/discord/dispatcher.rs

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::context::BotSession;
use crate::models::{InteractionEvent, InteractionKind, OutgoingMessage};
use crate::services::discord::confirmation::{CONFIRMATION_EXPIRED, RouteResult};
use crate::services::discord::executor::CommandExecutor;
use crate::services::discord::handlers::{
    AutocompleteHandler, ContextMenuHandler, InteractionHandler, ModalSubmitHandler,
    SlashCommandHandler,
};

/// Routes each interaction to exactly one handler by kind. Button presses go
/// to the component router instead.
pub struct InteractionDispatcher {
    session: Arc<BotSession>,
    slash: Arc<dyn InteractionHandler>,
    autocomplete: Arc<dyn InteractionHandler>,
    context_menu: Arc<dyn InteractionHandler>,
    modal: Arc<dyn InteractionHandler>,
}

impl InteractionDispatcher {
    pub fn new(session: Arc<BotSession>) -> Self {
        let executor = CommandExecutor::new(session.clone());
        Self {
            slash: Arc::new(SlashCommandHandler::new(executor.clone())),
            autocomplete: Arc::new(AutocompleteHandler::new(session.clone())),
            context_menu: Arc::new(ContextMenuHandler::new(executor.clone())),
            modal: Arc::new(ModalSubmitHandler::new(executor)),
            session,
        }
    }

    pub fn session(&self) -> &Arc<BotSession> {
        &self.session
    }

    pub async fn dispatch(&self, event: &InteractionEvent) {
        let handler = match &event.kind {
            InteractionKind::SlashCommand { .. } => &self.slash,
            InteractionKind::Autocomplete { .. } => &self.autocomplete,
            InteractionKind::ContextMenu { .. } => &self.context_menu,
            InteractionKind::ModalSubmit { .. } => &self.modal,
            InteractionKind::Component { custom_id } => {
                self.route_component(event, custom_id).await;
                return;
            }
            InteractionKind::Unsupported => {
                trace!("ignoring unsupported interaction {}", event.interaction.id);
                return;
            }
        };

        if !self.server_enabled(event).await {
            debug!(
                "guild {} is disabled; ignoring interaction {}",
                event.guild_id().unwrap_or("-"),
                event.interaction.id
            );
            return;
        }

        trace!("dispatching interaction {} to {}", event.interaction.id, handler.id());
        if let Err(e) = handler.handle(event).await {
            warn!("{} failed on interaction {}: {e}", handler.id(), event.interaction.id);
        }
    }

    async fn route_component(&self, event: &InteractionEvent, custom_id: &str) {
        match self
            .session
            .components
            .route(custom_id, event.interaction.clone(), &event.user.id)
        {
            RouteResult::Delivered => {}
            RouteResult::NotConfirmation => {
                trace!("ignoring component '{custom_id}'");
            }
            RouteResult::Expired => {
                let notice = OutgoingMessage::text(CONFIRMATION_EXPIRED).ephemeral(true);
                if let Err(e) = self.session.client.reply(&event.interaction, notice).await {
                    debug!("could not answer expired confirmation press: {e}");
                }
            }
        }
    }

    /// A guild without a record is enabled; store errors fail open.
    async fn server_enabled(&self, event: &InteractionEvent) -> bool {
        let Some(guild_id) = event.guild_id() else {
            return true;
        };
        match self.session.servers.get_server_by_server_id(guild_id).await {
            Ok(Some(server)) => server.enabled,
            Ok(None) => true,
            Err(e) => {
                warn!("could not read server record for {guild_id}: {e}");
                true
            }
        }
    }
}
