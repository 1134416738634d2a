// File: src/services/discord/handlers/mod.rs

use async_trait::async_trait;

use crate::Error;
use crate::models::InteractionEvent;

pub mod autocomplete;
pub mod context_menu;
pub mod modal;
pub mod slash;

pub use autocomplete::AutocompleteHandler;
pub use context_menu::ContextMenuHandler;
pub use modal::ModalSubmitHandler;
pub use slash::SlashCommandHandler;

pub const COMMAND_UNAVAILABLE_MESSAGE: &str = "This command is not available.";

/// One handler per interaction kind.
#[async_trait]
pub trait InteractionHandler: Send + Sync {
    /// Returns a unique identifier for this handler
    fn id(&self) -> &str;

    /// Drives the interaction to a terminal outcome. Errors returned here are
    /// failures to even load the command; execution errors are handled inside.
    async fn handle(&self, event: &InteractionEvent) -> Result<(), Error>;
}
