// File: src/context.rs
//
// The bot session: one per process, built at startup and shared as
// `Arc<BotSession>` with every handler and service.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use relaybot_common::traits::repository_traits::{
    CommandLogRepository, CommandRepository, ServerRepository,
};

use crate::cache::AutocompleteCache;
use crate::http::HttpClient;
use crate::platforms::{GuildDirectory, InteractionClient};
use crate::services::discord::confirmation::ComponentRouter;

const LATENCY_UNKNOWN: u64 = u64::MAX;

/// Timing and behaviour knobs of the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub confirmation_timeout: Duration,
    /// Budget for computing and sending autocomplete suggestions.
    pub autocomplete_deadline: Duration,
    pub external_autocomplete_timeout: Duration,
    pub autocomplete_cache_ttl: Duration,
    pub webhook_timeout: Duration,
    pub text_command_prefix: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(60),
            autocomplete_deadline: Duration::from_millis(1500),
            external_autocomplete_timeout: Duration::from_millis(1500),
            autocomplete_cache_ttl: Duration::from_secs(30),
            webhook_timeout: Duration::from_secs(5),
            text_command_prefix: "!".to_string(),
        }
    }
}

pub struct BotSession {
    /// Application id of the bot; also the owner key of its commands.
    pub bot_id: String,
    pub started_at: DateTime<Utc>,
    pub settings: EngineSettings,

    pub commands: Arc<dyn CommandRepository>,
    pub servers: Arc<dyn ServerRepository>,
    pub logs: Arc<dyn CommandLogRepository>,

    pub client: Arc<dyn InteractionClient>,
    pub guilds: Arc<dyn GuildDirectory>,
    pub http: Arc<dyn HttpClient>,

    pub components: ComponentRouter,
    pub autocomplete_cache: AutocompleteCache,

    latency_ms: AtomicU64,
    registered: RwLock<Vec<String>>,
}

pub struct BotSessionParts {
    pub bot_id: String,
    pub settings: EngineSettings,
    pub commands: Arc<dyn CommandRepository>,
    pub servers: Arc<dyn ServerRepository>,
    pub logs: Arc<dyn CommandLogRepository>,
    pub client: Arc<dyn InteractionClient>,
    pub guilds: Arc<dyn GuildDirectory>,
    pub http: Arc<dyn HttpClient>,
}

impl BotSession {
    pub fn new(parts: BotSessionParts) -> Self {
        let ttl = parts.settings.autocomplete_cache_ttl;
        Self {
            bot_id: parts.bot_id,
            started_at: Utc::now(),
            settings: parts.settings,
            commands: parts.commands,
            servers: parts.servers,
            logs: parts.logs,
            client: parts.client,
            guilds: parts.guilds,
            http: parts.http,
            components: ComponentRouter::new(),
            autocomplete_cache: AutocompleteCache::new(ttl),
            latency_ms: AtomicU64::new(LATENCY_UNKNOWN),
            registered: RwLock::new(Vec::new()),
        }
    }

    /// Latest gateway heartbeat latency in milliseconds, if measured yet.
    pub fn latency_ms(&self) -> Option<u64> {
        match self.latency_ms.load(Ordering::Relaxed) {
            LATENCY_UNKNOWN => None,
            ms => Some(ms),
        }
    }

    pub fn record_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(LATENCY_UNKNOWN - 1);
        self.latency_ms.store(ms, Ordering::Relaxed);
    }

    /// Names the platform accepted on the last successful registration.
    pub async fn registered_commands(&self) -> Vec<String> {
        self.registered.read().await.clone()
    }

    pub(crate) async fn set_registered_commands(&self, names: Vec<String>) {
        *self.registered.write().await = names;
    }

    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}
