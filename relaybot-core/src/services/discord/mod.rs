// File: src/services/discord/mod.rs

pub mod autocomplete;
pub mod confirmation;
pub mod dispatcher;
pub mod executor;
pub mod handlers;
pub mod permissions;
pub mod registrar;
pub mod template;
pub mod text_commands;

pub use dispatcher::InteractionDispatcher;
pub use executor::CommandExecutor;
pub use registrar::{CommandRegistrar, ReloadReport};
pub use text_commands::TextCommandHandler;
