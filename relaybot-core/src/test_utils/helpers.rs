// File: relaybot-core/src/test_utils/helpers.rs

use sqlx::{Connection, PgConnection, Pool, Postgres};
use tracing::info;

use crate::Error;
use crate::db::{Database, PoolSettings};

const TEST_DB: &str = "relaybot_test";

/// Create the test database if it does not exist yet.
pub async fn ensure_test_database_exists() -> Result<(), Error> {
    let admin_url = std::env::var("DATABASE_ADMIN_URL")
        .unwrap_or_else(|_| "postgres://relaybot@localhost/postgres".to_string());
    let mut conn = PgConnection::connect(&admin_url).await?;

    let create_db_sql = format!("CREATE DATABASE {TEST_DB};");
    match sqlx::query(&create_db_sql).execute(&mut conn).await {
        Ok(_) => info!("Created test DB '{TEST_DB}'."),
        // 42P04 => duplicate_database
        Err(e) if e
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == "42P04") =>
        {
            info!("Test DB '{TEST_DB}' already exists; ignoring.");
        }
        Err(e) => return Err(Error::Database(e)),
    }

    Ok(())
}

/// Pool for `TEST_DATABASE_URL`, defaulting to a local `relaybot_test`.
pub async fn create_test_db_pool() -> Result<Pool<Postgres>, Error> {
    let url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| format!("postgres://relaybot@localhost/{TEST_DB}"));

    let pool = PoolSettings::default().pool_options().connect(&url).await?;

    Ok(pool)
}

/// Wipes out test data so each test can start fresh.
pub async fn clean_database(pool: &Pool<Postgres>) -> Result<(), Error> {
    sqlx::query("TRUNCATE TABLE command_logs, commands, servers RESTART IDENTITY CASCADE;")
        .execute(pool)
        .await?;
    Ok(())
}

/// Returns a migrated, empty test DB handle.
pub async fn setup_test_database() -> Result<Database, Error> {
    ensure_test_database_exists().await?;
    let db = Database::from_pool(create_test_db_pool().await?);
    db.migrate().await?;
    clean_database(db.pool()).await?;
    Ok(db)
}
