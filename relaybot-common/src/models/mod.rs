pub mod command;
pub mod command_log;
pub mod server;

pub use command::{
    ApiMethod, AutocompleteConfig, AutocompleteService, Command, CommandKind, CommandOption,
    ContextMenuType, MAX_COMMAND_NAME_LEN, MAX_DESCRIPTION_LEN, MAX_MODAL_FIELDS, ModalConfig,
    ModalField, OptionType, RequiredPermission, TextInputStyle, normalize_options,
    placeholder_key,
};
pub use command_log::{CallbackOutcome, CommandLog, LogStatus};
pub use server::Server;
