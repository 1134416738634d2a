// File: relaybot-core/src/test_utils/fixtures.rs
//
// A fully in-memory bot plus builders for the events it reacts to.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::{BotSession, BotSessionParts, EngineSettings};
use crate::models::{
    ChannelContext, Command, CommandKind, ContextTarget, FocusedOption, GuildContext, IncomingMessage,
    InteractionEvent, InteractionKind, InteractionRef, InvokingUser, MemberPermissions, OptionValue,
    ResolvedOption,
};
use crate::repositories::{
    InMemoryCommandLogRepository, InMemoryCommandRepository, InMemoryServerRepository,
};
use crate::services::discord::InteractionDispatcher;

use super::fakes::{RecordingInteractionClient, ScriptedHttpClient, StaticGuildDirectory};

pub const BOT_ID: &str = "42";
pub const GUILD_ID: &str = "1";
pub const CHANNEL_ID: &str = "500";

static NEXT_INTERACTION: AtomicU64 = AtomicU64::new(1000);

/// Session wired to in-memory stores and recording fakes, with handles to
/// each so tests can inspect what happened.
pub struct TestBot {
    pub session: Arc<BotSession>,
    pub client: Arc<RecordingInteractionClient>,
    pub commands: Arc<InMemoryCommandRepository>,
    pub servers: Arc<InMemoryServerRepository>,
    pub logs: Arc<InMemoryCommandLogRepository>,
    pub http: Arc<ScriptedHttpClient>,
    pub guilds: Arc<StaticGuildDirectory>,
}

impl TestBot {
    pub fn new() -> Self {
        Self::with_http(ScriptedHttpClient::ok("{}"))
    }

    pub fn with_http(http: ScriptedHttpClient) -> Self {
        Self::build(http, EngineSettings::default())
    }

    pub fn build(http: ScriptedHttpClient, settings: EngineSettings) -> Self {
        let client = Arc::new(RecordingInteractionClient::new());
        let commands = Arc::new(InMemoryCommandRepository::new());
        let servers = Arc::new(InMemoryServerRepository::new());
        let logs = Arc::new(InMemoryCommandLogRepository::new());
        let http = Arc::new(http);
        let guilds = Arc::new(StaticGuildDirectory::sample());

        let session = Arc::new(BotSession::new(BotSessionParts {
            bot_id: BOT_ID.to_string(),
            settings,
            commands: commands.clone(),
            servers: servers.clone(),
            logs: logs.clone(),
            client: client.clone(),
            guilds: guilds.clone(),
            http: http.clone(),
        }));

        Self { session, client, commands, servers, logs, http, guilds }
    }

    pub fn dispatcher(&self) -> InteractionDispatcher {
        InteractionDispatcher::new(self.session.clone())
    }

    /// Stores a command owned by this bot.
    pub async fn add(&self, cmd: Command) -> Command {
        use crate::repositories::CommandRepository;
        if let Err(e) = self.commands.create_command(&cmd).await {
            panic!("could not seed command '{}': {e}", cmd.name);
        }
        cmd
    }

    pub async fn usage_of(&self, name: &str) -> i64 {
        use crate::repositories::CommandRepository;
        match self.commands.get_command_by_name(BOT_ID, name).await {
            Ok(Some(cmd)) => cmd.usage_count,
            _ => panic!("command '{name}' not found"),
        }
    }
}

impl Default for TestBot {
    fn default() -> Self {
        Self::new()
    }
}

/// A command owned by `BOT_ID` with a response template.
pub fn command(name: &str, kind: CommandKind, response: &str) -> Command {
    let mut cmd = Command::new(BOT_ID, name, kind);
    cmd.description = Some(format!("{name} command"));
    cmd.response = response.to_string();
    cmd
}

pub fn user(id: &str, username: &str) -> InvokingUser {
    InvokingUser {
        id: id.to_string(),
        username: username.to_string(),
        display_name: username.to_string(),
        discriminator: None,
        avatar_url: None,
    }
}

/// Builds interaction events in guild "1" / channel "500", invoked by alice
/// without special permissions unless told otherwise.
pub struct EventBuilder {
    kind: InteractionKind,
    user: InvokingUser,
    permissions: MemberPermissions,
    guild: Option<GuildContext>,
    channel: Option<ChannelContext>,
}

impl EventBuilder {
    fn new(kind: InteractionKind) -> Self {
        Self {
            kind,
            user: user("10", "alice"),
            permissions: MemberPermissions::default(),
            guild: Some(GuildContext {
                id: GUILD_ID.into(),
                name: "Rustaceans".into(),
                owner_id: Some("99".into()),
            }),
            channel: Some(ChannelContext {
                id: CHANNEL_ID.into(),
                name: Some("general".into()),
            }),
        }
    }

    pub fn slash(name: &str) -> Self {
        Self::new(InteractionKind::SlashCommand {
            command_name: name.to_string(),
            options: Vec::new(),
        })
    }

    pub fn autocomplete(name: &str, focused: &str, input: &str) -> Self {
        Self::new(InteractionKind::Autocomplete {
            command_name: name.to_string(),
            options: Vec::new(),
            focused: FocusedOption {
                name: focused.to_string(),
                input: input.to_string(),
            },
        })
    }

    pub fn context_menu(name: &str, target: ContextTarget) -> Self {
        Self::new(InteractionKind::ContextMenu {
            command_name: name.to_string(),
            target,
        })
    }

    pub fn modal(custom_id: &str, fields: &[(&str, &str)]) -> Self {
        Self::new(InteractionKind::ModalSubmit {
            custom_id: custom_id.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    pub fn component(custom_id: &str) -> Self {
        Self::new(InteractionKind::Component {
            custom_id: custom_id.to_string(),
        })
    }

    /// Adds a filled option to slash and autocomplete events.
    pub fn option(mut self, name: &str, value: OptionValue) -> Self {
        match &mut self.kind {
            InteractionKind::SlashCommand { options, .. }
            | InteractionKind::Autocomplete { options, .. } => {
                options.push(ResolvedOption::new(name, value));
            }
            _ => {}
        }
        self
    }

    pub fn by(mut self, id: &str, username: &str) -> Self {
        self.user = user(id, username);
        self
    }

    pub fn admin(mut self) -> Self {
        self.permissions.administrator = true;
        self
    }

    pub fn moderator(mut self) -> Self {
        self.permissions.manage_messages = true;
        self
    }

    pub fn in_dm(mut self) -> Self {
        self.guild = None;
        self
    }

    pub fn build(self) -> InteractionEvent {
        let id = NEXT_INTERACTION.fetch_add(1, Ordering::Relaxed).to_string();
        InteractionEvent {
            interaction: InteractionRef {
                token: format!("token-{id}"),
                id,
                application_id: BOT_ID.to_string(),
            },
            kind: self.kind,
            user: self.user,
            permissions: self.permissions,
            guild: self.guild,
            channel: self.channel,
        }
    }
}

/// A chat message from alice in guild "1" / channel "500".
pub fn message(content: &str) -> IncomingMessage {
    let id = NEXT_INTERACTION.fetch_add(1, Ordering::Relaxed).to_string();
    IncomingMessage {
        message_id: id,
        content: content.to_string(),
        author: user("10", "alice"),
        author_is_bot: false,
        guild: Some(GuildContext {
            id: GUILD_ID.into(),
            name: "Rustaceans".into(),
            owner_id: Some("99".into()),
        }),
        channel: ChannelContext {
            id: CHANNEL_ID.into(),
            name: Some("general".into()),
        },
    }
}
