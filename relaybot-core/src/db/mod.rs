// relaybot-core/src/db/mod.rs
//
// Postgres pool holding the command, server and audit tables.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::info;

use crate::Error;

/// Connection pool sizing for the command store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a query waits for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolSettings {
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections.max(1))
            .min_connections(self.min_connections.min(self.max_connections))
            .acquire_timeout(self.acquire_timeout)
    }
}

#[derive(Clone)]
pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self, Error> {
        let pool = settings.pool_options().connect(database_url).await?;
        info!(
            "Connected to Postgres (max_connections={}, acquire_timeout={}s)",
            settings.max_connections,
            settings.acquire_timeout.as_secs()
        );
        Ok(Self { pool })
    }

    /// Applies the bundled schema for commands, servers and command logs.
    pub async fn migrate(&self) -> Result<(), Error> {
        let migrator = sqlx::migrate!("../migrations");
        info!("Applying {} migration(s)", migrator.iter().count());
        migrator.run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}
