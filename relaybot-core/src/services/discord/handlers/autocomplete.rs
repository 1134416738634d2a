// File: src/services/discord/handlers/autocomplete.rs

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::Error;
use crate::context::BotSession;
use crate::models::{AutocompleteChoice, InteractionEvent, InteractionKind, InteractionRef};
use crate::services::discord::autocomplete::{AutocompleteResolver, SuggestionRequest, previous_parameters};
use crate::services::discord::handlers::InteractionHandler;

/// Answers autocomplete keystrokes. Every failure is swallowed: the worst
/// case for the user is an empty or missing suggestion list.
pub struct AutocompleteHandler {
    session: Arc<BotSession>,
    resolver: AutocompleteResolver,
}

impl AutocompleteHandler {
    pub fn new(session: Arc<BotSession>) -> Self {
        let resolver = AutocompleteResolver::new(session.clone());
        Self { session, resolver }
    }

    async fn respond(&self, interaction: &InteractionRef, choices: Vec<AutocompleteChoice>) {
        if let Err(e) = self.session.client.autocomplete(interaction, choices).await {
            debug!("autocomplete response dropped: {e}");
        }
    }
}

#[async_trait]
impl InteractionHandler for AutocompleteHandler {
    fn id(&self) -> &str {
        "discord.autocomplete"
    }

    async fn handle(&self, event: &InteractionEvent) -> Result<(), Error> {
        let InteractionKind::Autocomplete { command_name, options, focused } = &event.kind else {
            return Ok(());
        };

        let command = match self
            .session
            .commands
            .get_command_by_name(&self.session.bot_id, command_name)
            .await
        {
            Ok(command) => command.filter(|c| c.is_active),
            Err(e) => {
                debug!("autocomplete for /{command_name}: could not load command: {e}");
                None
            }
        };
        let Some(command) = command else {
            self.respond(&event.interaction, Vec::new()).await;
            return Ok(());
        };
        let config = match command.option(&focused.name).and_then(|o| o.autocomplete.as_ref()) {
            Some(cfg) if cfg.enabled => cfg,
            _ => {
                trace!("/{command_name} option '{}' has no autocomplete", focused.name);
                self.respond(&event.interaction, Vec::new()).await;
                return Ok(());
            }
        };

        let previous = previous_parameters(config, &focused.name, options);
        let request = SuggestionRequest {
            command: &command.name,
            option: &focused.name,
            config,
            input: &focused.input,
            user_id: &event.user.id,
            guild_id: event.guild_id(),
            previous: &previous,
        };

        let deadline = self.session.settings.autocomplete_deadline;
        match tokio::time::timeout(deadline, self.resolver.suggestions(&request)).await {
            Ok(Ok(choices)) => self.respond(&event.interaction, choices).await,
            Ok(Err(e)) => {
                debug!("autocomplete lookup for /{command_name} failed: {e}");
                self.respond(&event.interaction, Vec::new()).await;
            }
            Err(_) => {
                debug!(
                    "autocomplete for /{command_name} exceeded {}ms; not responding",
                    deadline.as_millis()
                );
            }
        }
        Ok(())
    }
}
