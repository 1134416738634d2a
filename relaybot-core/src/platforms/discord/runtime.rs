// File: relaybot-core/src/platforms/discord/runtime.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{
    self as gateway, CloseFrame, Config, Event, EventTypeFlags, Intents, MessageSender, Shard,
    StreamExt,
};
use twilight_http::Client as HttpClient;
use twilight_http::client::ClientBuilder;
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;

use crate::Error;
use crate::context::BotSession;
use crate::platforms::ConnectionStatus;
use crate::services::discord::{
    CommandExecutor, CommandRegistrar, InteractionDispatcher, TextCommandHandler,
};

use super::client::TwilightInteractionClient;
use super::convert;
use super::directory::CacheGuildDirectory;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a shard needs to turn gateway events into engine calls.
struct ShardContext {
    session: Arc<BotSession>,
    cache: Arc<InMemoryCache>,
    dispatcher: InteractionDispatcher,
    text_commands: TextCommandHandler,
    registrar: CommandRegistrar,
    registered_once: AtomicBool,
}

impl ShardContext {
    async fn handle_event(self: &Arc<Self>, shard_id: u32, event: Event) {
        match event {
            Event::Ready(ready) => {
                info!(
                    "Shard {shard_id} => READY as {} (ID={}) in {} guilds",
                    ready.user.name,
                    ready.user.id,
                    ready.guilds.len()
                );
                // Every shard reports READY; the global command set is
                // registered once per process.
                if !self.registered_once.swap(true, Ordering::SeqCst) {
                    let ctx = Arc::clone(self);
                    tokio::spawn(async move {
                        match ctx.registrar.sync().await {
                            Ok(report) if report.skipped => {
                                info!("No registrable commands; skipped registration")
                            }
                            Ok(report) => info!("Registered {} commands", report.count),
                            Err(e) => error!("Command registration failed: {e}"),
                        }
                    });
                }
            }
            Event::InteractionCreate(interaction) => {
                let Some(event) = convert::interaction_event(&interaction, self.session.guilds.as_ref())
                else {
                    debug!("Interaction {} has no author; dropping", interaction.id);
                    return;
                };
                let ctx = Arc::clone(self);
                tokio::spawn(async move {
                    ctx.dispatcher.dispatch(&event).await;
                });
            }
            Event::MessageCreate(message) => {
                if message.author.bot {
                    return;
                }
                let incoming = convert::incoming_message(&message, self.session.guilds.as_ref());
                let ctx = Arc::clone(self);
                tokio::spawn(async move {
                    if let Err(e) = ctx.text_commands.handle_message(&incoming).await {
                        warn!("Text command from {} failed: {e}", incoming.author.id);
                    }
                });
            }
            other => {
                trace!("Shard {shard_id} => unhandled event: {:?}", other.kind());
            }
        }
    }
}

async fn shard_runner(mut shard: Shard, ctx: Arc<ShardContext>) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        match item {
            Ok(event) => {
                ctx.cache.update(&event);
                if matches!(event, Event::GatewayHeartbeatAck) {
                    if let Some(latency) = shard.latency().average() {
                        ctx.session.record_latency(latency);
                    }
                    continue;
                }
                ctx.handle_event(shard_id, event).await;
            }
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

/// Gateway connection plus the REST client and cache built for it.
pub struct DiscordPlatform {
    token: String,
    pub connection_status: ConnectionStatus,
    http: Arc<HttpClient>,
    cache: Arc<InMemoryCache>,
    application_id: Id<ApplicationMarker>,
    shard_tasks: Vec<JoinHandle<()>>,
    shard_senders: Vec<MessageSender>,
}

impl DiscordPlatform {
    /// Builds the REST client and resolves the application id. No gateway
    /// connection is opened until `start`.
    pub async fn connect(token: String) -> Result<Self, Error> {
        if token.is_empty() {
            return Err(Error::Platform("Discord token is empty".into()));
        }
        let http = Arc::new(
            ClientBuilder::new()
                .token(token.clone())
                .timeout(HTTP_TIMEOUT)
                .build(),
        );
        let application = http
            .current_user_application()
            .await
            .map_err(|e| Error::Platform(format!("current_user_application: {e}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("current_user_application body: {e}")))?;
        info!("(DiscordPlatform) Application id {}", application.id);

        let cache = Arc::new(
            InMemoryCache::builder()
                .resource_types(
                    ResourceType::GUILD
                        | ResourceType::CHANNEL
                        | ResourceType::ROLE
                        | ResourceType::MEMBER
                        | ResourceType::USER,
                )
                .build(),
        );

        Ok(Self {
            token,
            connection_status: ConnectionStatus::Disconnected,
            http,
            cache,
            application_id: application.id,
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
        })
    }

    pub fn application_id(&self) -> String {
        self.application_id.to_string()
    }

    pub fn interaction_client(&self) -> TwilightInteractionClient {
        TwilightInteractionClient::new(self.http.clone(), self.application_id)
    }

    pub fn guild_directory(&self) -> CacheGuildDirectory {
        CacheGuildDirectory::new(self.cache.clone())
    }

    /// Opens the recommended number of shards and routes their events into
    /// the engine.
    pub async fn start(&mut self, session: Arc<BotSession>) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordPlatform) Already connected => skipping");
            return Ok(());
        }

        let ctx = Arc::new(ShardContext {
            dispatcher: InteractionDispatcher::new(session.clone()),
            text_commands: TextCommandHandler::new(CommandExecutor::new(session.clone())),
            registrar: CommandRegistrar::new(session.clone()),
            cache: self.cache.clone(),
            session,
            registered_once: AtomicBool::new(false),
        });

        let config = Config::new(
            self.token.clone(),
            Intents::GUILDS
                | Intents::GUILD_MEMBERS
                | Intents::GUILD_MESSAGES
                | Intents::MESSAGE_CONTENT,
        );
        let shards = match gateway::create_recommended(&self.http, config, |_, b| b.build()).await {
            Ok(shards) => shards,
            Err(e) => {
                self.connection_status = ConnectionStatus::Error(e.to_string());
                return Err(Error::Platform(format!("create_recommended error: {e}")));
            }
        };

        for shard in shards {
            self.shard_senders.push(shard.sender());
            let ctx = ctx.clone();
            self.shard_tasks
                .push(tokio::spawn(async move { shard_runner(shard, ctx).await }));
        }

        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    /// Resolves once every shard loop has ended.
    pub async fn wait(&mut self) {
        for task in self.shard_tasks.drain(..) {
            if let Err(e) = task.await {
                error!("Shard task panicked: {e}");
            }
        }
        self.connection_status = ConnectionStatus::Disconnected;
    }

    pub async fn disconnect(&mut self) {
        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        self.shard_senders.clear();
        self.wait().await;
    }
}
