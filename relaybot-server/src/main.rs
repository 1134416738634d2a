use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use relaybot_core::platforms::discord::DiscordPlatform;
use relaybot_core::services::CommandService;
use relaybot_core::{BotSession, BotSessionParts, DefaultHttpClient, EngineSettings, PoolSettings};

mod context;

#[derive(Parser, Debug, Clone)]
#[command(name = "relaybot")]
#[command(author, version, about = "RelayBot - configurable Discord command engine")]
pub struct Args {
    /// Bot token used for the gateway and REST calls.
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub discord_token: String,

    /// Postgres connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://relaybot@localhost:5432/relaybot"
    )]
    pub database_url: String,

    /// Upper bound on pooled Postgres connections.
    #[arg(long, env = "RELAYBOT_DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub db_max_connections: u32,

    #[arg(long, env = "RELAYBOT_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 30)]
    pub db_acquire_timeout_secs: u64,

    /// Keep commands, servers and logs in process memory (nothing persists).
    #[arg(long, env = "RELAYBOT_IN_MEMORY")]
    pub in_memory: bool,

    /// Prefix for text and embed commands.
    #[arg(long, env = "RELAYBOT_PREFIX", default_value = "!")]
    pub prefix: String,

    #[arg(long, env = "RELAYBOT_CONFIRMATION_TIMEOUT_SECS", default_value_t = 60)]
    pub confirmation_timeout_secs: u64,

    #[arg(long, env = "RELAYBOT_WEBHOOK_TIMEOUT_SECS", default_value_t = 5)]
    pub webhook_timeout_secs: u64,
}

impl Args {
    fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.db_max_connections,
            acquire_timeout: Duration::from_secs(self.db_acquire_timeout_secs),
            ..PoolSettings::default()
        }
    }

    fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
            webhook_timeout: Duration::from_secs(self.webhook_timeout_secs),
            text_command_prefix: self.prefix.clone(),
            ..EngineSettings::default()
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("relaybot_core=info,relaybot_server=info"));
    fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already be set.
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!(
        "RelayBot starting. in_memory={}, prefix='{}'",
        args.in_memory, args.prefix
    );

    if let Err(e) = run_server(args).await {
        error!("Server error: {e:?}");
        return Err(e);
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    let repos = context::build_repositories(&args)
        .await
        .context("setting up storage")?;

    let mut platform = DiscordPlatform::connect(args.discord_token.clone())
        .await
        .context("connecting to Discord")?;

    let session = Arc::new(BotSession::new(BotSessionParts {
        bot_id: platform.application_id(),
        settings: args.engine_settings(),
        commands: repos.commands,
        servers: repos.servers,
        logs: repos.logs,
        client: Arc::new(platform.interaction_client()),
        guilds: Arc::new(platform.guild_directory()),
        http: Arc::new(DefaultHttpClient::new()),
    }));

    let commands = CommandService::new(session.clone());
    match commands.list_commands().await {
        Ok(list) => info!(
            "{} command(s) configured for bot {}",
            list.len(),
            session.bot_id
        ),
        Err(e) => warn!("could not list commands for bot {}: {e}", session.bot_id),
    }

    platform
        .start(session.clone())
        .await
        .context("starting the gateway")?;

    tokio::select! {
        _ = platform.wait() => {
            warn!("every shard has stopped");
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Ctrl-C handler error: {e}");
            }
            info!("Ctrl-C received; shutting down");
        }
    }

    platform.disconnect().await;
    info!(
        "session for bot {} ran {}s",
        session.bot_id,
        session.uptime().num_seconds()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_flags_reach_the_database_settings() {
        let args = Args::try_parse_from([
            "relaybot",
            "--discord-token",
            "token",
            "--db-max-connections",
            "9",
            "--db-acquire-timeout-secs",
            "4",
        ])
        .expect("valid flags");
        let settings = args.pool_settings();
        assert_eq!(settings.max_connections, 9);
        assert_eq!(settings.acquire_timeout, Duration::from_secs(4));
        assert_eq!(settings.min_connections, 0);
    }
}
