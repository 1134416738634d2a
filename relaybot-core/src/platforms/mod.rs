// File: src/platforms/mod.rs
//
// Seams between the engine and the chat platform. `InteractionClient` covers
// every outbound call the engine makes; `GuildDirectory` exposes the cached
// guild state the built-in autocomplete lookups and the text-command
// permission check read from.

use async_trait::async_trait;
use twilight_model::application::command::Command as PlatformCommand;

use crate::Error;
use crate::models::{
    AutocompleteChoice, InteractionRef, MemberPermissions, ModalConfig, OutgoingMessage,
};

pub mod discord;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Error(String),
}

#[async_trait]
pub trait InteractionClient: Send + Sync {
    /// Acknowledge now, answer later via `edit_original`.
    async fn defer(&self, interaction: &InteractionRef, ephemeral: bool) -> Result<(), Error>;
    /// Initial response carrying a message.
    async fn reply(&self, interaction: &InteractionRef, message: OutgoingMessage) -> Result<(), Error>;
    async fn edit_original(&self, interaction: &InteractionRef, message: OutgoingMessage) -> Result<(), Error>;
    async fn follow_up(&self, interaction: &InteractionRef, message: OutgoingMessage) -> Result<(), Error>;
    /// Initial response to a button press that edits the message the button is on.
    async fn update_component_message(
        &self,
        interaction: &InteractionRef,
        message: OutgoingMessage,
    ) -> Result<(), Error>;
    async fn show_modal(&self, interaction: &InteractionRef, modal: &ModalConfig) -> Result<(), Error>;
    async fn autocomplete(
        &self,
        interaction: &InteractionRef,
        choices: Vec<AutocompleteChoice>,
    ) -> Result<(), Error>;
    /// Replaces the whole global command set; returns the registered names.
    async fn set_global_commands(&self, commands: Vec<PlatformCommand>) -> Result<Vec<String>, Error>;
    async fn send_channel_message(&self, channel_id: &str, message: OutgoingMessage) -> Result<(), Error>;
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSummary {
    pub id: String,
    pub name: String,
    pub owner_id: Option<String>,
    pub member_count: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Voice,
    Category,
    Announcement,
    Forum,
    Stage,
    Thread,
    Other,
}

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Text => "text",
            ChannelKind::Voice => "voice",
            ChannelKind::Category => "category",
            ChannelKind::Announcement => "announcement",
            ChannelKind::Forum => "forum",
            ChannelKind::Stage => "stage",
            ChannelKind::Thread => "thread",
            ChannelKind::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "guild_text" | "0" => Some(ChannelKind::Text),
            "voice" | "guild_voice" | "2" => Some(ChannelKind::Voice),
            "category" | "guild_category" | "4" => Some(ChannelKind::Category),
            "announcement" | "news" | "guild_announcement" | "5" => Some(ChannelKind::Announcement),
            "forum" | "guild_forum" | "15" => Some(ChannelKind::Forum),
            "stage" | "guild_stage_voice" | "13" => Some(ChannelKind::Stage),
            "thread" => Some(ChannelKind::Thread),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    pub id: String,
    pub guild_id: String,
    pub name: String,
    pub kind: ChannelKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSummary {
    pub id: String,
    pub name: String,
    pub permissions: MemberPermissions,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSummary {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role_ids: Vec<String>,
    pub bot: bool,
}

/// Read-only view over the gateway cache.
pub trait GuildDirectory: Send + Sync {
    fn guilds(&self) -> Vec<GuildSummary>;
    fn guild(&self, guild_id: &str) -> Option<GuildSummary>;
    fn channels(&self, guild_id: &str) -> Vec<ChannelSummary>;
    fn roles(&self, guild_id: &str) -> Vec<RoleSummary>;
    fn members(&self, guild_id: &str) -> Vec<MemberSummary>;

    /// Union of the member's role permissions plus `@everyone`
    /// (the role whose id equals the guild id).
    fn member_permissions(&self, guild_id: &str, user_id: &str) -> MemberPermissions {
        let Some(member) = self.members(guild_id).into_iter().find(|m| m.id == user_id) else {
            return MemberPermissions::default();
        };
        self.roles(guild_id)
            .into_iter()
            .filter(|role| role.id == guild_id || member.role_ids.contains(&role.id))
            .fold(MemberPermissions::default(), |acc, role| MemberPermissions {
                administrator: acc.administrator || role.permissions.administrator,
                manage_messages: acc.manage_messages || role.permissions.manage_messages,
            })
    }
}
