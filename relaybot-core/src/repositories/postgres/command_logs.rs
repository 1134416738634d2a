// File: relaybot-core/src/repositories/postgres/command_logs.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use relaybot_common::error::Error;
use relaybot_common::models::{CallbackOutcome, CommandLog, LogStatus};
use relaybot_common::traits::repository_traits::CommandLogRepository;

pub struct PostgresCommandLogRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresCommandLogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn parse_status(s: &str) -> Result<LogStatus, Error> {
    LogStatus::parse(s).ok_or_else(|| Error::Parse(format!("unknown log status '{s}'")))
}

fn row_to_log(r: &PgRow) -> Result<CommandLog, Error> {
    let status: String = r.try_get("status")?;
    let parameters: Value = r.try_get("parameters")?;
    let parameters = match parameters {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let callback_status: Option<String> = r.try_get("callback_status")?;
    let callback = match callback_status {
        Some(s) => {
            let http_status: Option<i32> = r.try_get("callback_http_status")?;
            let timestamp: Option<DateTime<Utc>> = r.try_get("callback_timestamp")?;
            Some(CallbackOutcome {
                status: parse_status(&s)?,
                http_status: http_status.and_then(|c| u16::try_from(c).ok()),
                error: r.try_get("callback_error")?,
                timestamp: timestamp.unwrap_or_else(Utc::now),
            })
        }
        None => None,
    };

    Ok(CommandLog {
        log_id: r.try_get("log_id")?,
        bot_id: r.try_get("bot_id")?,
        server_id: r.try_get("server_id")?,
        server_name: r.try_get("server_name")?,
        channel_id: r.try_get("channel_id")?,
        channel_name: r.try_get("channel_name")?,
        user_id: r.try_get("user_id")?,
        user_name: r.try_get("user_name")?,
        command_name: r.try_get("command_name")?,
        status: parse_status(&status)?,
        timestamp: r.try_get("timestamp")?,
        parameters,
        error_message: r.try_get("error_message")?,
        callback,
    })
}

#[async_trait]
impl CommandLogRepository for PostgresCommandLogRepository {
    async fn create_command_log(&self, entry: &CommandLog) -> Result<(), Error> {
        let callback = entry.callback.as_ref();
        sqlx::query(
            r#"
            INSERT INTO command_logs (
                log_id, bot_id, server_id, server_name, channel_id, channel_name,
                user_id, user_name, command_name, status, timestamp, parameters,
                error_message, callback_status, callback_http_status, callback_error,
                callback_timestamp
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17)
            "#,
        )
            .bind(entry.log_id)
            .bind(&entry.bot_id)
            .bind(&entry.server_id)
            .bind(&entry.server_name)
            .bind(&entry.channel_id)
            .bind(&entry.channel_name)
            .bind(&entry.user_id)
            .bind(&entry.user_name)
            .bind(&entry.command_name)
            .bind(entry.status.as_str())
            .bind(entry.timestamp)
            .bind(Value::Object(entry.parameters.clone()))
            .bind(&entry.error_message)
            .bind(callback.map(|c| c.status.as_str()))
            .bind(callback.and_then(|c| c.http_status).map(i32::from))
            .bind(callback.and_then(|c| c.error.clone()))
            .bind(callback.map(|c| c.timestamp))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_logs_for_bot(&self, bot_id: &str, limit: i64) -> Result<Vec<CommandLog>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT
                log_id, bot_id, server_id, server_name, channel_id, channel_name,
                user_id, user_name, command_name, status, timestamp, parameters,
                error_message, callback_status, callback_http_status, callback_error,
                callback_timestamp
            FROM command_logs
            WHERE bot_id = $1
            ORDER BY timestamp DESC
            LIMIT $2
            "#,
        )
            .bind(bot_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_log).collect()
    }
}
