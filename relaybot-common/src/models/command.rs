use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Error;

pub const MAX_COMMAND_NAME_LEN: usize = 32;
pub const MAX_DESCRIPTION_LEN: usize = 100;
pub const MAX_MODAL_FIELDS: usize = 5;

static COMMAND_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+$").expect("static regex"));
static WEBHOOK_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://").expect("static regex"));

/// How a command is invoked and how its response is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    Text,
    Slash,
    Embed,
    ContextMenu,
    Modal,
}

impl CommandKind {
    /// Kinds that exist on the platform side and must be bulk-registered.
    pub fn is_registrable(self) -> bool {
        matches!(self, CommandKind::Slash | CommandKind::ContextMenu | CommandKind::Modal)
    }

    /// Kinds invoked through a prefixed chat message.
    pub fn is_message_command(self) -> bool {
        matches!(self, CommandKind::Text | CommandKind::Embed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMenuType {
    User,
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequiredPermission {
    #[default]
    Everyone,
    Moderator,
    Admin,
    ServerOwner,
}

/// Slash command option types. Unknown type strings read from storage
/// fall back to `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OptionType {
    #[default]
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Number,
    Attachment,
}

impl OptionType {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionType::String => "STRING",
            OptionType::Integer => "INTEGER",
            OptionType::Boolean => "BOOLEAN",
            OptionType::User => "USER",
            OptionType::Channel => "CHANNEL",
            OptionType::Role => "ROLE",
            OptionType::Number => "NUMBER",
            OptionType::Attachment => "ATTACHMENT",
        }
    }

    /// Numeric application-command option type used on the wire.
    pub fn code(self) -> u8 {
        match self {
            OptionType::String => 3,
            OptionType::Integer => 4,
            OptionType::Boolean => 5,
            OptionType::User => 6,
            OptionType::Channel => 7,
            OptionType::Role => 8,
            OptionType::Number => 10,
            OptionType::Attachment => 11,
        }
    }

    pub fn supports_autocomplete(self) -> bool {
        matches!(self, OptionType::String | OptionType::Integer | OptionType::Number)
    }
}

impl From<String> for OptionType {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "INTEGER" => OptionType::Integer,
            "BOOLEAN" => OptionType::Boolean,
            "USER" => OptionType::User,
            "CHANNEL" => OptionType::Channel,
            "ROLE" => OptionType::Role,
            "NUMBER" => OptionType::Number,
            "ATTACHMENT" => OptionType::Attachment,
            _ => OptionType::String,
        }
    }
}

impl From<OptionType> for String {
    fn from(t: OptionType) -> Self {
        t.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutocompleteService {
    Servers,
    Channels,
    Roles,
    Users,
    #[default]
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiMethod {
    #[default]
    Get,
    Post,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutocompleteConfig {
    pub enabled: bool,
    pub service: AutocompleteService,
    pub api_url: Option<String>,
    pub api_method: ApiMethod,
    pub api_headers: HashMap<String, String>,
    pub api_body: Option<Value>,
    pub use_previous_parameters: bool,
    /// Allow-list of earlier option names forwarded as filters. Empty means all.
    pub filter_by_parameters: Vec<String>,
}

impl AutocompleteConfig {
    /// External URL to query, if one is configured.
    pub fn external_url(&self) -> Option<&str> {
        self.api_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn forwards(&self, option_name: &str) -> bool {
        self.filter_by_parameters.is_empty()
            || self
                .filter_by_parameters
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(option_name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: OptionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub autocomplete: Option<AutocompleteConfig>,
}

impl CommandOption {
    pub fn new(name: &str, kind: OptionType) -> Self {
        Self {
            name: placeholder_key(name),
            description: String::new(),
            kind,
            required: false,
            autocomplete: None,
        }
    }

    /// Key used for `{name}` placeholders.
    pub fn placeholder_key(&self) -> String {
        placeholder_key(&self.name)
    }

    pub fn autocomplete_enabled(&self) -> bool {
        self.autocomplete.as_ref().is_some_and(|cfg| cfg.enabled)
    }
}

/// Lowercases an option name and joins words with `_`.
pub fn placeholder_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Decodes a stored `options` value into the ordered option list.
///
/// Older records keep options as an object keyed by option name; newer ones
/// keep an array. Both shapes end up as the same `Vec<CommandOption>`.
pub fn normalize_options(value: &Value) -> Result<Vec<CommandOption>, Error> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| decode_option(None, item))
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(key, item)| decode_option(Some(key), item))
            .collect(),
        other => Err(Error::Parse(format!("unsupported options shape: {other}"))),
    }
}

fn decode_option(key: Option<&String>, item: &Value) -> Result<CommandOption, Error> {
    let mut item = item.clone();
    if let (Some(key), Value::Object(obj)) = (key, &mut item) {
        obj.entry("name").or_insert_with(|| Value::String(key.clone()));
    }
    let mut opt: CommandOption = serde_json::from_value(item)?;
    opt.name = placeholder_key(&opt.name);
    Ok(opt)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TextInputStyle {
    #[default]
    Short,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalField {
    pub custom_id: String,
    pub label: String,
    #[serde(default)]
    pub style: TextInputStyle,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub min_length: Option<u16>,
    #[serde(default)]
    pub max_length: Option<u16>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalConfig {
    pub custom_id: String,
    pub title: String,
    pub fields: Vec<ModalField>,
}

/// A configured bot behaviour, owned by the management API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub command_id: Uuid,
    pub bot_id: String,
    pub name: String,
    pub kind: CommandKind,
    pub context_menu_type: Option<ContextMenuType>,
    pub description: Option<String>,
    pub response: String,
    pub options: Vec<CommandOption>,
    pub modal: Option<ModalConfig>,

    pub required_permission: RequiredPermission,
    pub cooldown_seconds: i32,
    pub enabled_for_all_servers: bool,
    pub delete_user_message: bool,
    pub log_usage: bool,
    pub is_active: bool,

    pub require_confirmation: bool,
    pub confirmation_message: Option<String>,
    pub cancel_message: Option<String>,

    pub webhook_url: Option<String>,
    pub webhook_failure_message: Option<String>,

    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Command {
    pub fn new(bot_id: &str, name: &str, kind: CommandKind) -> Self {
        let now = Utc::now();
        Self {
            command_id: Uuid::new_v4(),
            bot_id: bot_id.to_string(),
            name: name.to_lowercase(),
            kind,
            context_menu_type: None,
            description: None,
            response: String::new(),
            options: Vec::new(),
            modal: None,
            required_permission: RequiredPermission::Everyone,
            cooldown_seconds: 0,
            enabled_for_all_servers: true,
            delete_user_message: false,
            log_usage: true,
            is_active: true,
            require_confirmation: false,
            confirmation_message: None,
            cancel_message: None,
            webhook_url: None,
            webhook_failure_message: None,
            usage_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Active commands of a kind that lives on the platform side.
    pub fn is_registrable(&self) -> bool {
        self.is_active && self.kind.is_registrable()
    }

    /// Case-insensitive lookup of a declared option.
    pub fn option(&self, name: &str) -> Option<&CommandOption> {
        self.options
            .iter()
            .find(|opt| opt.name.eq_ignore_ascii_case(name))
    }

    /// The webhook URL, only when it looks like an http(s) URL.
    pub fn webhook_target(&self) -> Option<&str> {
        self.webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| WEBHOOK_URL_RE.is_match(url))
    }

    /// Shape checks the management API runs before persisting.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() || self.name.chars().count() > MAX_COMMAND_NAME_LEN {
            return Err(Error::Validation(format!(
                "command name must be 1-{MAX_COMMAND_NAME_LEN} characters"
            )));
        }
        if !COMMAND_NAME_RE.is_match(&self.name) {
            return Err(Error::Validation(format!(
                "command name '{}' may only contain letters, digits, '_' and '-'",
                self.name
            )));
        }

        if self.kind == CommandKind::Slash {
            match self.description.as_deref().map(str::trim) {
                None | Some("") => {
                    return Err(Error::Validation("slash commands need a description".into()));
                }
                Some(desc) if desc.chars().count() > MAX_DESCRIPTION_LEN => {
                    return Err(Error::Validation(format!(
                        "description must be at most {MAX_DESCRIPTION_LEN} characters"
                    )));
                }
                Some(_) => {}
            }
        }

        if self.kind == CommandKind::ContextMenu && self.context_menu_type.is_none() {
            return Err(Error::Validation(
                "context-menu commands need a contextMenuType".into(),
            ));
        }

        if self.kind == CommandKind::Modal {
            let Some(modal) = &self.modal else {
                return Err(Error::Validation("modal commands need modal fields".into()));
            };
            if modal.fields.is_empty() || modal.fields.len() > MAX_MODAL_FIELDS {
                return Err(Error::Validation(format!(
                    "a modal needs 1-{MAX_MODAL_FIELDS} fields"
                )));
            }
        }

        if let Some(url) = self.webhook_url.as_deref().map(str::trim) {
            if !url.is_empty() && !WEBHOOK_URL_RE.is_match(url) {
                return Err(Error::Validation(format!(
                    "webhook URL '{url}' must start with http:// or https://"
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandKind::Text => "text",
            CommandKind::Slash => "slash",
            CommandKind::Embed => "embed",
            CommandKind::ContextMenu => "context-menu",
            CommandKind::Modal => "modal",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_decode_from_array_and_keyed_object() {
        let array = json!([
            { "name": "Target User", "type": "USER", "required": true },
            { "name": "reason", "type": "STRING" }
        ]);
        let opts = normalize_options(&array).unwrap();
        assert_eq!(opts.len(), 2);
        assert_eq!(opts[0].name, "target_user");
        assert_eq!(opts[0].kind, OptionType::User);
        assert!(opts[0].required);

        let keyed = json!({ "amount": { "type": "INTEGER", "description": "how many" } });
        let opts = normalize_options(&keyed).unwrap();
        assert_eq!(opts[0].name, "amount");
        assert_eq!(opts[0].kind, OptionType::Integer);
    }

    #[test]
    fn unknown_option_type_falls_back_to_string() {
        let opts = normalize_options(&json!([{ "name": "x", "type": "MENTIONABLE" }])).unwrap();
        assert_eq!(opts[0].kind, OptionType::String);
        assert_eq!(opts[0].kind.code(), 3);
    }

    #[test]
    fn validate_rejects_bad_definitions() {
        let mut cmd = Command::new("bot", "ban user", CommandKind::Text);
        assert!(matches!(cmd.validate(), Err(Error::Validation(_))));

        cmd.name = "ban".into();
        cmd.kind = CommandKind::Slash;
        assert!(cmd.validate().is_err(), "slash without description");

        cmd.description = Some("x".repeat(101));
        assert!(cmd.validate().is_err());

        cmd.description = Some("Bans someone".into());
        cmd.webhook_url = Some("ftp://example.com".into());
        assert!(cmd.validate().is_err());

        cmd.webhook_url = Some("https://example.com/hook".into());
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn webhook_target_requires_http_scheme() {
        let mut cmd = Command::new("bot", "ping", CommandKind::Slash);
        cmd.webhook_url = Some("example.com".into());
        assert_eq!(cmd.webhook_target(), None);
        cmd.webhook_url = Some("http://example.com".into());
        assert_eq!(cmd.webhook_target(), Some("http://example.com"));
    }
}
