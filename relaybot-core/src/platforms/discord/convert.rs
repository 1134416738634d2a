// File: relaybot-core/src/platforms/discord/convert.rs
//
// Gateway payloads -> engine models.

use twilight_model::application::command::CommandType;
use twilight_model::application::interaction::application_command::{
    CommandData, CommandDataOption, CommandOptionValue,
};
use twilight_model::application::interaction::{
    Interaction, InteractionData, InteractionDataResolved, InteractionType,
};
use twilight_model::channel::Message;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, RoleMarker, UserMarker};
use twilight_model::user::User;

use crate::models::{
    AttachmentValue, ChannelContext, ContextTarget, FocusedOption, GuildContext, IncomingMessage,
    InteractionEvent, InteractionKind, InteractionRef, InvokingUser, OptionValue, ResolvedOption,
};
use crate::platforms::GuildDirectory;

use super::directory::member_permissions;

const AVATAR_CDN: &str = "https://cdn.discordapp.com/avatars";

fn invoking_user(user: &User, nick: Option<&str>) -> InvokingUser {
    let display_name = nick
        .map(str::to_string)
        .or_else(|| user.global_name.clone())
        .unwrap_or_else(|| user.name.clone());
    InvokingUser {
        id: user.id.to_string(),
        username: user.name.clone(),
        display_name,
        // Migrated accounts report discriminator 0.
        discriminator: (user.discriminator != 0).then(|| format!("{:04}", user.discriminator)),
        avatar_url: user
            .avatar
            .map(|hash| format!("{AVATAR_CDN}/{}/{hash}.png", user.id)),
    }
}

fn guild_context(guild_id: Id<GuildMarker>, guilds: &dyn GuildDirectory) -> GuildContext {
    let id = guild_id.to_string();
    match guilds.guild(&id) {
        Some(summary) => GuildContext {
            id,
            name: summary.name,
            owner_id: summary.owner_id,
        },
        None => GuildContext {
            name: id.clone(),
            id,
            owner_id: None,
        },
    }
}

fn resolved_user_name(resolved: Option<&InteractionDataResolved>, id: Id<UserMarker>) -> Option<String> {
    let resolved = resolved?;
    let nick = resolved.members.get(&id).and_then(|m| m.nick.clone());
    nick.or_else(|| {
        resolved
            .users
            .get(&id)
            .map(|u| u.global_name.clone().unwrap_or_else(|| u.name.clone()))
    })
}

fn option_value(option: &CommandDataOption, resolved: Option<&InteractionDataResolved>) -> Option<OptionValue> {
    let value = match &option.value {
        CommandOptionValue::String(s) => OptionValue::String(s.clone()),
        CommandOptionValue::Integer(i) => OptionValue::Integer(*i),
        CommandOptionValue::Number(n) => OptionValue::Number(*n),
        CommandOptionValue::Boolean(b) => OptionValue::Boolean(*b),
        CommandOptionValue::User(id) => OptionValue::User {
            id: id.to_string(),
            name: resolved_user_name(resolved, *id),
        },
        CommandOptionValue::Mentionable(id) => {
            let as_user = id.cast::<UserMarker>();
            match resolved.and_then(|r| r.roles.get(&id.cast::<RoleMarker>())) {
                Some(role) => OptionValue::Role {
                    id: id.to_string(),
                    name: Some(role.name.clone()),
                },
                None => OptionValue::User {
                    id: id.to_string(),
                    name: resolved_user_name(resolved, as_user),
                },
            }
        }
        CommandOptionValue::Channel(id) => OptionValue::Channel {
            id: id.to_string(),
            name: resolved.and_then(|r| r.channels.get(id)).map(|c| c.name.clone()),
        },
        CommandOptionValue::Role(id) => OptionValue::Role {
            id: id.to_string(),
            name: resolved.and_then(|r| r.roles.get(id)).map(|r| r.name.clone()),
        },
        CommandOptionValue::Attachment(id) => {
            let att = resolved?.attachments.get(id)?;
            OptionValue::Attachment(AttachmentValue {
                filename: att.filename.clone(),
                url: att.url.clone(),
                size: att.size,
            })
        }
        // Focused values and sub-command trees are handled by the caller.
        _ => return None,
    };
    Some(value)
}

fn resolved_options(data: &CommandData) -> Vec<ResolvedOption> {
    data.options
        .iter()
        .filter_map(|opt| {
            option_value(opt, data.resolved.as_ref()).map(|value| ResolvedOption::new(&opt.name, value))
        })
        .collect()
}

fn focused_option(data: &CommandData) -> Option<FocusedOption> {
    data.options.iter().find_map(|opt| match &opt.value {
        CommandOptionValue::Focused(input, _) => Some(FocusedOption {
            name: opt.name.clone(),
            input: input.clone(),
        }),
        _ => None,
    })
}

fn context_target(data: &CommandData) -> Option<ContextTarget> {
    let target = data.target_id?;
    match data.kind {
        CommandType::User => {
            let user_id = target.cast::<UserMarker>();
            let name = resolved_user_name(data.resolved.as_ref(), user_id)
                .unwrap_or_else(|| target.to_string());
            Some(ContextTarget::User {
                id: target.to_string(),
                name,
            })
        }
        CommandType::Message => Some(ContextTarget::Message {
            id: target.to_string(),
        }),
        _ => None,
    }
}

fn interaction_kind(interaction: &Interaction) -> InteractionKind {
    match (interaction.kind, interaction.data.as_ref()) {
        (InteractionType::ApplicationCommand, Some(InteractionData::ApplicationCommand(data))) => {
            match data.kind {
                CommandType::ChatInput => InteractionKind::SlashCommand {
                    command_name: data.name.clone(),
                    options: resolved_options(data),
                },
                CommandType::User | CommandType::Message => match context_target(data) {
                    Some(target) => InteractionKind::ContextMenu {
                        command_name: data.name.clone(),
                        target,
                    },
                    None => InteractionKind::Unsupported,
                },
                _ => InteractionKind::Unsupported,
            }
        }
        (
            InteractionType::ApplicationCommandAutocomplete,
            Some(InteractionData::ApplicationCommand(data)),
        ) => match focused_option(data) {
            Some(focused) => InteractionKind::Autocomplete {
                command_name: data.name.clone(),
                options: resolved_options(data),
                focused,
            },
            None => InteractionKind::Unsupported,
        },
        (InteractionType::MessageComponent, Some(InteractionData::MessageComponent(data))) => {
            InteractionKind::Component {
                custom_id: data.custom_id.clone(),
            }
        }
        (InteractionType::ModalSubmit, Some(InteractionData::ModalSubmit(data))) => {
            let fields = data
                .components
                .iter()
                .flat_map(|row| row.components.iter())
                .map(|c| (c.custom_id.clone(), c.value.clone().unwrap_or_default()))
                .collect();
            InteractionKind::ModalSubmit {
                custom_id: data.custom_id.clone(),
                fields,
            }
        }
        _ => InteractionKind::Unsupported,
    }
}

/// Converts a gateway interaction. Returns `None` when there is no invoking
/// user to attribute it to.
pub fn interaction_event(interaction: &Interaction, guilds: &dyn GuildDirectory) -> Option<InteractionEvent> {
    let author = interaction.author()?;
    let member = interaction.member.as_ref();
    let user = invoking_user(author, member.and_then(|m| m.nick.as_deref()));
    let permissions = member
        .and_then(|m| m.permissions)
        .map(member_permissions)
        .unwrap_or_default();

    Some(InteractionEvent {
        interaction: InteractionRef {
            id: interaction.id.to_string(),
            application_id: interaction.application_id.to_string(),
            token: interaction.token.clone(),
        },
        kind: interaction_kind(interaction),
        user,
        permissions,
        guild: interaction.guild_id.map(|id| guild_context(id, guilds)),
        channel: interaction.channel.as_ref().map(|c| ChannelContext {
            id: c.id.to_string(),
            name: c.name.clone(),
        }),
    })
}

pub fn incoming_message(message: &Message, guilds: &dyn GuildDirectory) -> IncomingMessage {
    let guild = message.guild_id.map(|id| guild_context(id, guilds));
    let channel_id = message.channel_id.to_string();
    let channel_name = guild.as_ref().and_then(|g| {
        guilds
            .channels(&g.id)
            .into_iter()
            .find(|c| c.id == channel_id)
            .map(|c| c.name)
    });
    let nick = message.member.as_ref().and_then(|m| m.nick.as_deref());

    IncomingMessage {
        message_id: message.id.to_string(),
        content: message.content.clone(),
        author: invoking_user(&message.author, nick),
        author_is_bot: message.author.bot,
        guild,
        channel: ChannelContext {
            id: channel_id,
            name: channel_name,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StaticGuildDirectory;
    use serde_json::json;

    fn user_json(id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "username": name,
            "discriminator": "0",
            "global_name": null,
            "avatar": null,
        })
    }

    fn interaction(kind: u8, data: serde_json::Value) -> Interaction {
        serde_json::from_value(json!({
            "id": "900",
            "application_id": "42",
            "type": kind,
            "token": "tok",
            "version": 1,
            "locale": "en-US",
            "entitlements": [],
            "authorizing_integration_owners": {},
            "guild_id": "1",
            "channel": { "id": "500", "type": 0, "name": "general" },
            "member": {
                "user": user_json("10", "alice"),
                "roles": ["100"],
                "joined_at": "2024-01-01T00:00:00+00:00",
                "deaf": false,
                "mute": false,
                "flags": 0,
                "permissions": "8",
                "nick": "Ally",
            },
            "data": data,
        }))
        .expect("interaction fixture")
    }

    #[test]
    fn slash_command_with_resolved_user() {
        let data = json!({
            "id": "77",
            "name": "ban",
            "type": 1,
            "options": [
                { "name": "target", "type": 6, "value": "11" },
                { "name": "days", "type": 4, "value": 3 },
            ],
            "resolved": { "users": { "11": user_json("11", "bob") } },
        });
        let event = interaction_event(&interaction(2, data), &StaticGuildDirectory::sample()).unwrap();

        assert_eq!(event.user.display_name, "Ally");
        assert!(event.permissions.administrator);
        assert_eq!(event.server_name(), "Rustaceans");
        assert_eq!(event.channel.as_ref().and_then(|c| c.name.as_deref()), Some("general"));
        let InteractionKind::SlashCommand { command_name, options } = event.kind else {
            panic!("expected slash command");
        };
        assert_eq!(command_name, "ban");
        assert_eq!(options[0].value.display(), "bob");
        assert_eq!(options[1].value, OptionValue::Integer(3));
    }

    #[test]
    fn autocomplete_splits_focused_from_filled() {
        let data = json!({
            "id": "77",
            "name": "lookup",
            "type": 1,
            "options": [
                { "name": "region", "type": 3, "value": "eu" },
                { "name": "city", "type": 3, "value": "ber", "focused": true },
            ],
        });
        let event = interaction_event(&interaction(4, data), &StaticGuildDirectory::sample()).unwrap();
        let InteractionKind::Autocomplete { options, focused, .. } = event.kind else {
            panic!("expected autocomplete");
        };
        assert_eq!(focused.name, "city");
        assert_eq!(focused.input, "ber");
        assert_eq!(options.len(), 1);
    }

    #[test]
    fn modal_submit_flattens_rows() {
        let data = json!({
            "custom_id": "feedback",
            "components": [
                { "type": 1, "components": [{ "type": 4, "custom_id": "subject", "value": "hi" }] },
                { "type": 1, "components": [{ "type": 4, "custom_id": "body", "value": "text" }] },
            ],
        });
        let event = interaction_event(&interaction(5, data), &StaticGuildDirectory::sample()).unwrap();
        assert_eq!(
            event.kind,
            InteractionKind::ModalSubmit {
                custom_id: "feedback".into(),
                fields: vec![("subject".into(), "hi".into()), ("body".into(), "text".into())],
            }
        );
    }
}
