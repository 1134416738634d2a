// File: src/services/discord/registrar.rs

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use twilight_model::application::command::{
    Command as PlatformCommand, CommandOption as PlatformOption, CommandType,
};
use twilight_util::builder::command::{
    AttachmentBuilder, BooleanBuilder, ChannelBuilder, CommandBuilder, IntegerBuilder,
    NumberBuilder, RoleBuilder, StringBuilder, UserBuilder,
};

use crate::Error;
use crate::context::BotSession;
use crate::models::{
    Command, CommandKind, CommandOption, ContextMenuType, MAX_DESCRIPTION_LEN, OptionType,
};

/// Result of a full re-registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadReport {
    pub registered: Vec<String>,
    pub count: usize,
    /// No registrable command existed, so no call was made.
    pub skipped: bool,
}

/// Pushes every active slash, context-menu and modal command to the platform
/// in one bulk replace.
pub struct CommandRegistrar {
    session: Arc<BotSession>,
}

impl CommandRegistrar {
    pub fn new(session: Arc<BotSession>) -> Self {
        Self { session }
    }

    pub async fn sync(&self) -> Result<ReloadReport, Error> {
        let session = &self.session;
        let commands: Vec<Command> = session
            .commands
            .list_commands(&session.bot_id)
            .await?
            .into_iter()
            .filter(Command::is_registrable)
            .collect();

        // An empty bulk replace would wipe every remote command.
        if commands.is_empty() {
            info!("no registrable commands for bot {}; skipping registration", session.bot_id);
            return Ok(ReloadReport {
                registered: Vec::new(),
                count: 0,
                skipped: true,
            });
        }

        let payload: Vec<PlatformCommand> = commands.iter().map(build_platform_command).collect();
        let registered = session.client.set_global_commands(payload).await?;
        session.set_registered_commands(registered.clone()).await;

        info!("registered {} global commands for bot {}", registered.len(), session.bot_id);
        Ok(ReloadReport {
            count: registered.len(),
            registered,
            skipped: false,
        })
    }
}

/// Platform registration entry for one stored command.
pub fn build_platform_command(cmd: &Command) -> PlatformCommand {
    if cmd.kind == CommandKind::ContextMenu {
        let kind = match cmd.context_menu_type {
            Some(ContextMenuType::Message) => CommandType::Message,
            _ => CommandType::User,
        };
        return CommandBuilder::new(cmd.name.clone(), "", kind).build();
    }

    let description = cmd
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(&cmd.name);
    let mut builder = CommandBuilder::new(
        cmd.name.clone(),
        clip_description(description),
        CommandType::ChatInput,
    );

    if cmd.kind == CommandKind::Slash {
        // The platform requires required options before optional ones.
        let mut options: Vec<&CommandOption> = cmd.options.iter().collect();
        options.sort_by_key(|opt| !opt.required);
        for opt in options {
            builder = builder.option(build_option(opt));
        }
    }

    builder.build()
}

fn build_option(opt: &CommandOption) -> PlatformOption {
    let description = if opt.description.trim().is_empty() {
        clip_description(&opt.name)
    } else {
        clip_description(&opt.description)
    };
    let autocomplete = opt.autocomplete_enabled() && opt.kind.supports_autocomplete();
    let name = opt.name.clone();

    match opt.kind {
        OptionType::String => StringBuilder::new(name, description)
            .required(opt.required)
            .autocomplete(autocomplete)
            .build(),
        OptionType::Integer => IntegerBuilder::new(name, description)
            .required(opt.required)
            .autocomplete(autocomplete)
            .build(),
        OptionType::Number => NumberBuilder::new(name, description)
            .required(opt.required)
            .autocomplete(autocomplete)
            .build(),
        OptionType::Boolean => BooleanBuilder::new(name, description).required(opt.required).build(),
        OptionType::User => UserBuilder::new(name, description).required(opt.required).build(),
        OptionType::Channel => ChannelBuilder::new(name, description).required(opt.required).build(),
        OptionType::Role => RoleBuilder::new(name, description).required(opt.required).build(),
        OptionType::Attachment => AttachmentBuilder::new(name, description).required(opt.required).build(),
    }
}

fn clip_description(s: &str) -> String {
    s.chars().take(MAX_DESCRIPTION_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use twilight_model::application::command::CommandOptionType;

    use crate::models::AutocompleteConfig;

    #[test]
    fn context_menu_carries_name_and_type_only() {
        let mut cmd = Command::new("bot", "inspect", CommandKind::ContextMenu);
        cmd.context_menu_type = Some(ContextMenuType::Message);
        cmd.description = Some("ignored".into());
        let built = build_platform_command(&cmd);
        assert_eq!(built.kind, CommandType::Message);
        assert_eq!(built.description, "");
        assert!(built.options.is_empty());
    }

    #[test]
    fn slash_options_map_types_and_put_required_first() {
        let mut cmd = Command::new("bot", "give", CommandKind::Slash);
        cmd.description = Some("Give an item".into());
        let mut item = CommandOption::new("item", OptionType::String);
        item.autocomplete = Some(AutocompleteConfig { enabled: true, ..Default::default() });
        let mut target = CommandOption::new("target", OptionType::User);
        target.required = true;
        cmd.options = vec![item, target, CommandOption::new("proof", OptionType::Attachment)];

        let built = build_platform_command(&cmd);
        assert_eq!(built.kind, CommandType::ChatInput);
        assert_eq!(built.description, "Give an item");
        let kinds: Vec<_> = built.options.iter().map(|o| (o.name.as_str(), o.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("target", CommandOptionType::User),
                ("item", CommandOptionType::String),
                ("proof", CommandOptionType::Attachment),
            ]
        );
        assert_eq!(built.options[0].required, Some(true));
        assert_eq!(built.options[1].autocomplete, Some(true));
        assert_eq!(built.options[1].description, "item");
    }

    #[test]
    fn modal_commands_register_as_bare_chat_input() {
        let mut cmd = Command::new("bot", "feedback", CommandKind::Modal);
        cmd.options = vec![CommandOption::new("unused", OptionType::String)];
        let built = build_platform_command(&cmd);
        assert_eq!(built.kind, CommandType::ChatInput);
        assert_eq!(built.description, "feedback");
        assert!(built.options.is_empty());
    }
}
