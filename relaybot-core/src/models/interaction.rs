// File: relaybot-core/src/models/interaction.rs
//
// Platform-neutral view of an incoming interaction. The Discord runtime
// converts twilight's `Interaction` into these types before dispatch, so the
// engine and its tests never touch gateway payloads directly.

use serde_json::{Map, Value};

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Handle needed to answer an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRef {
    pub id: String,
    pub application_id: String,
    pub token: String,
}

impl InteractionRef {
    /// Webhook URL a remote service can post follow-up messages to.
    pub fn follow_up_url(&self) -> String {
        format!("{DISCORD_API_BASE}/webhooks/{}/{}", self.application_id, self.token)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberPermissions {
    pub administrator: bool,
    pub manage_messages: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokingUser {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub discriminator: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildContext {
    pub id: String,
    pub name: String,
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelContext {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentValue {
    pub filename: String,
    pub url: String,
    /// Size in bytes.
    pub size: u64,
}

impl AttachmentValue {
    /// Upper-cased file extension, empty when the name has none.
    pub fn extension(&self) -> String {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_uppercase())
            .unwrap_or_default()
    }

    /// Size in kilobytes, rounded to the nearest whole KB.
    pub fn size_kb(&self) -> u64 {
        (self.size as f64 / 1024.0).round() as u64
    }

    /// `name (EXT)`, the bare placeholder form.
    pub fn label(&self) -> String {
        format!("{} ({})", self.filename, self.extension())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User { id: String, name: Option<String> },
    Channel { id: String, name: Option<String> },
    Role { id: String, name: Option<String> },
    Attachment(AttachmentValue),
}

impl OptionValue {
    /// Form substituted into templates.
    pub fn display(&self) -> String {
        match self {
            OptionValue::String(s) => s.clone(),
            OptionValue::Integer(i) => i.to_string(),
            OptionValue::Number(n) => n.to_string(),
            OptionValue::Boolean(b) => b.to_string(),
            OptionValue::User { id, name }
            | OptionValue::Channel { id, name }
            | OptionValue::Role { id, name } => name.clone().unwrap_or_else(|| id.clone()),
            OptionValue::Attachment(att) => att.label(),
        }
    }

    /// Raw form used for autocomplete filters: snowflakes stay ids.
    pub fn raw(&self) -> String {
        match self {
            OptionValue::User { id, .. }
            | OptionValue::Channel { id, .. }
            | OptionValue::Role { id, .. } => id.clone(),
            other => other.display(),
        }
    }

    /// Form recorded in audit logs and webhook payloads.
    pub fn to_json(&self) -> Value {
        match self {
            OptionValue::String(s) => Value::String(s.clone()),
            OptionValue::Integer(i) => Value::from(*i),
            OptionValue::Number(n) => Value::from(*n),
            OptionValue::Boolean(b) => Value::Bool(*b),
            OptionValue::User { id, .. }
            | OptionValue::Channel { id, .. }
            | OptionValue::Role { id, .. } => Value::String(id.clone()),
            OptionValue::Attachment(att) => {
                let mut obj = Map::new();
                obj.insert("name".into(), Value::String(att.filename.clone()));
                obj.insert("extension".into(), Value::String(att.extension()));
                obj.insert("url".into(), Value::String(att.url.clone()));
                obj.insert("size".into(), Value::from(att.size));
                Value::Object(obj)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOption {
    pub name: String,
    pub value: OptionValue,
}

impl ResolvedOption {
    pub fn new(name: &str, value: OptionValue) -> Self {
        Self { name: name.to_string(), value }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextTarget {
    User { id: String, name: String },
    Message { id: String },
}

impl ContextTarget {
    pub fn id(&self) -> &str {
        match self {
            ContextTarget::User { id, .. } | ContextTarget::Message { id } => id,
        }
    }

    /// Value of the `{target}` placeholder.
    pub fn display_name(&self) -> &str {
        match self {
            ContextTarget::User { name, .. } => name,
            ContextTarget::Message { .. } => "Message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusedOption {
    pub name: String,
    pub input: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionKind {
    SlashCommand {
        command_name: String,
        options: Vec<ResolvedOption>,
    },
    Autocomplete {
        command_name: String,
        /// Already-filled options, excluding the focused one.
        options: Vec<ResolvedOption>,
        focused: FocusedOption,
    },
    ContextMenu {
        command_name: String,
        target: ContextTarget,
    },
    ModalSubmit {
        custom_id: String,
        /// `(custom_id, value)` pairs as submitted.
        fields: Vec<(String, String)>,
    },
    /// Button press on a message the bot sent.
    Component {
        custom_id: String,
    },
    Unsupported,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionEvent {
    pub interaction: InteractionRef,
    pub kind: InteractionKind,
    pub user: InvokingUser,
    pub permissions: MemberPermissions,
    pub guild: Option<GuildContext>,
    pub channel: Option<ChannelContext>,
}

impl InteractionEvent {
    pub fn guild_id(&self) -> Option<&str> {
        self.guild.as_ref().map(|g| g.id.as_str())
    }

    pub fn server_name(&self) -> &str {
        self.guild.as_ref().map_or("DM", |g| g.name.as_str())
    }

    pub fn is_guild_owner(&self) -> bool {
        self.guild
            .as_ref()
            .and_then(|g| g.owner_id.as_deref())
            .is_some_and(|owner| owner == self.user.id)
    }

    pub fn command_name(&self) -> Option<&str> {
        match &self.kind {
            InteractionKind::SlashCommand { command_name, .. }
            | InteractionKind::Autocomplete { command_name, .. }
            | InteractionKind::ContextMenu { command_name, .. } => Some(command_name),
            _ => None,
        }
    }
}

/// A chat message that may carry a prefixed text command.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub message_id: String,
    pub content: String,
    pub author: InvokingUser,
    pub author_is_bot: bool,
    pub guild: Option<GuildContext>,
    pub channel: ChannelContext,
}
