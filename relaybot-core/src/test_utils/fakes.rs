// File: relaybot-core/src/test_utils/fakes.rs
//
// In-process stand-ins for the platform and the outbound HTTP client.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use twilight_model::application::command::Command as PlatformCommand;

use crate::Error;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::models::{AutocompleteChoice, InteractionRef, MemberPermissions, ModalConfig, OutgoingMessage};
use crate::platforms::{
    ChannelKind, ChannelSummary, GuildDirectory, GuildSummary, InteractionClient, MemberSummary,
    RoleSummary,
};
use crate::services::discord::confirmation::parse_custom_id;

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Defer { interaction_id: String, ephemeral: bool },
    Reply { interaction_id: String, message: OutgoingMessage },
    EditOriginal { interaction_id: String, message: OutgoingMessage },
    FollowUp { interaction_id: String, message: OutgoingMessage },
    UpdateComponent { interaction_id: String, message: OutgoingMessage },
    ShowModal { interaction_id: String, custom_id: String },
    Autocomplete { interaction_id: String, choices: Vec<AutocompleteChoice> },
    SetGlobalCommands(Vec<PlatformCommand>),
    ChannelMessage { channel_id: String, message: OutgoingMessage },
    DeleteMessage { channel_id: String, message_id: String },
}

impl RecordedCall {
    pub fn message(&self) -> Option<&OutgoingMessage> {
        match self {
            RecordedCall::Reply { message, .. }
            | RecordedCall::EditOriginal { message, .. }
            | RecordedCall::FollowUp { message, .. }
            | RecordedCall::UpdateComponent { message, .. }
            | RecordedCall::ChannelMessage { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Records every outbound call in order.
#[derive(Default)]
pub struct RecordingInteractionClient {
    calls: Mutex<Vec<RecordedCall>>,
    fail_registration: AtomicBool,
    fail_replies: AtomicBool,
    failing_edits: AtomicUsize,
}

impl RecordingInteractionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `set_global_commands` return a platform error.
    pub fn fail_registration(&self, fail: bool) {
        self.fail_registration.store(fail, Ordering::SeqCst);
    }

    /// Makes initial responses (`defer`, `reply`) fail as if the token had
    /// already expired.
    pub fn expire_interactions(&self, expire: bool) {
        self.fail_replies.store(expire, Ordering::SeqCst);
    }

    /// Makes the next `count` calls to `edit_original` fail with a platform
    /// error. Failed calls are not recorded.
    pub fn fail_next_edits(&self, count: usize) {
        self.failing_edits.store(count, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        locked(&self.calls).clone()
    }

    pub fn clear(&self) {
        locked(&self.calls).clear();
    }

    /// Text of every message sent, in order.
    pub fn bodies(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|c| c.message().and_then(|m| m.body()).map(str::to_string))
            .collect()
    }

    pub fn registrations(&self) -> Vec<Vec<PlatformCommand>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::SetGlobalCommands(cmds) => Some(cmds),
                _ => None,
            })
            .collect()
    }

    /// Nonce of the most recent confirmation prompt, if one was shown.
    pub fn confirmation_nonce(&self) -> Option<String> {
        self.calls().iter().rev().find_map(|c| match c {
            RecordedCall::Reply { message, .. } => message
                .buttons
                .first()
                .and_then(|b| parse_custom_id(&b.custom_id))
                .map(|(_, nonce)| nonce.to_string()),
            _ => None,
        })
    }

    fn record(&self, call: RecordedCall) {
        locked(&self.calls).push(call);
    }

    fn check_initial(&self) -> Result<(), Error> {
        if self.fail_replies.load(Ordering::SeqCst) {
            return Err(Error::Interaction("Unknown interaction (10062)".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl InteractionClient for RecordingInteractionClient {
    async fn defer(&self, interaction: &InteractionRef, ephemeral: bool) -> Result<(), Error> {
        self.check_initial()?;
        self.record(RecordedCall::Defer {
            interaction_id: interaction.id.clone(),
            ephemeral,
        });
        Ok(())
    }

    async fn reply(&self, interaction: &InteractionRef, message: OutgoingMessage) -> Result<(), Error> {
        self.check_initial()?;
        self.record(RecordedCall::Reply {
            interaction_id: interaction.id.clone(),
            message,
        });
        Ok(())
    }

    async fn edit_original(&self, interaction: &InteractionRef, message: OutgoingMessage) -> Result<(), Error> {
        let failing = self
            .failing_edits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(Error::Platform("500 Internal Server Error".into()));
        }
        self.record(RecordedCall::EditOriginal {
            interaction_id: interaction.id.clone(),
            message,
        });
        Ok(())
    }

    async fn follow_up(&self, interaction: &InteractionRef, message: OutgoingMessage) -> Result<(), Error> {
        self.record(RecordedCall::FollowUp {
            interaction_id: interaction.id.clone(),
            message,
        });
        Ok(())
    }

    async fn update_component_message(
        &self,
        interaction: &InteractionRef,
        message: OutgoingMessage,
    ) -> Result<(), Error> {
        self.record(RecordedCall::UpdateComponent {
            interaction_id: interaction.id.clone(),
            message,
        });
        Ok(())
    }

    async fn show_modal(&self, interaction: &InteractionRef, modal: &ModalConfig) -> Result<(), Error> {
        self.check_initial()?;
        self.record(RecordedCall::ShowModal {
            interaction_id: interaction.id.clone(),
            custom_id: modal.custom_id.clone(),
        });
        Ok(())
    }

    async fn autocomplete(
        &self,
        interaction: &InteractionRef,
        choices: Vec<AutocompleteChoice>,
    ) -> Result<(), Error> {
        self.record(RecordedCall::Autocomplete {
            interaction_id: interaction.id.clone(),
            choices,
        });
        Ok(())
    }

    async fn set_global_commands(&self, commands: Vec<PlatformCommand>) -> Result<Vec<String>, Error> {
        let names = commands.iter().map(|c| c.name.clone()).collect();
        self.record(RecordedCall::SetGlobalCommands(commands));
        if self.fail_registration.load(Ordering::SeqCst) {
            return Err(Error::Platform("registration rejected".into()));
        }
        Ok(names)
    }

    async fn send_channel_message(&self, channel_id: &str, message: OutgoingMessage) -> Result<(), Error> {
        self.record(RecordedCall::ChannelMessage {
            channel_id: channel_id.to_string(),
            message,
        });
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), Error> {
        self.record(RecordedCall::DeleteMessage {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        });
        Ok(())
    }
}

/// Fixed guild state.
#[derive(Debug, Clone, Default)]
pub struct StaticGuildDirectory {
    pub guilds: Vec<GuildSummary>,
    pub channels: Vec<ChannelSummary>,
    pub roles: Vec<(String, RoleSummary)>,
    pub members: Vec<(String, MemberSummary)>,
}

impl StaticGuildDirectory {
    /// Guild "1" (Rustaceans, owned by "99") with three channels, the
    /// `@everyone` role plus Admins/Mods/Members, and one member per role:
    /// alice (10, Admins), bob (11, Mods), carol (12, Members).
    /// Guild "2" (Gophers) is empty.
    pub fn sample() -> Self {
        let guild = "1";
        let channel = |id: &str, name: &str, kind| ChannelSummary {
            id: id.into(),
            guild_id: guild.into(),
            name: name.into(),
            kind,
        };
        let role = |id: &str, name: &str, administrator, manage_messages, position| {
            (
                guild.to_string(),
                RoleSummary {
                    id: id.into(),
                    name: name.into(),
                    permissions: MemberPermissions { administrator, manage_messages },
                    position,
                },
            )
        };
        let member = |id: &str, name: &str, role_id: &str| {
            (
                guild.to_string(),
                MemberSummary {
                    id: id.into(),
                    username: name.into(),
                    display_name: name.into(),
                    role_ids: vec![role_id.into()],
                    bot: false,
                },
            )
        };

        Self {
            guilds: vec![
                GuildSummary {
                    id: "1".into(),
                    name: "Rustaceans".into(),
                    owner_id: Some("99".into()),
                    member_count: Some(3),
                },
                GuildSummary {
                    id: "2".into(),
                    name: "Gophers".into(),
                    owner_id: Some("98".into()),
                    member_count: Some(0),
                },
            ],
            channels: vec![
                channel("500", "general", ChannelKind::Text),
                channel("501", "general-voice", ChannelKind::Voice),
                channel("502", "random", ChannelKind::Text),
            ],
            roles: vec![
                role("1", "@everyone", false, false, 0),
                role("100", "Admins", true, false, 3),
                role("200", "Mods", false, true, 2),
                role("300", "Members", false, false, 1),
            ],
            members: vec![
                member("10", "alice", "100"),
                member("11", "bob", "200"),
                member("12", "carol", "300"),
            ],
        }
    }
}

impl GuildDirectory for StaticGuildDirectory {
    fn guilds(&self) -> Vec<GuildSummary> {
        self.guilds.clone()
    }

    fn guild(&self, guild_id: &str) -> Option<GuildSummary> {
        self.guilds.iter().find(|g| g.id == guild_id).cloned()
    }

    fn channels(&self, guild_id: &str) -> Vec<ChannelSummary> {
        self.channels.iter().filter(|c| c.guild_id == guild_id).cloned().collect()
    }

    fn roles(&self, guild_id: &str) -> Vec<RoleSummary> {
        self.roles
            .iter()
            .filter(|(g, _)| g == guild_id)
            .map(|(_, r)| r.clone())
            .collect()
    }

    fn members(&self, guild_id: &str) -> Vec<MemberSummary> {
        self.members
            .iter()
            .filter(|(g, _)| g == guild_id)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

/// Answers every request with the same canned response, optionally after a
/// delay, and remembers what it was asked.
pub struct ScriptedHttpClient {
    response: Result<HttpResponse, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            response: Ok(HttpResponse { status, body: body.into() }),
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every request at the transport level.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            response: Err(reason.into()),
            ..Self::ok("")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        locked(&self.requests).clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        locked(&self.requests).push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone().map_err(Error::Platform)
    }
}
