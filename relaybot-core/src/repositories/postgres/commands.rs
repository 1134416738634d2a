// File: relaybot-core/src/repositories/postgres/commands.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use relaybot_common::error::Error;
use relaybot_common::models::{Command, ModalConfig, normalize_options};
use relaybot_common::traits::repository_traits::CommandRepository;

use super::{enum_to_text, text_to_enum};

const COMMAND_COLUMNS: &str = r#"
    command_id, bot_id, name, kind, context_menu_type, description, response,
    options, modal, required_permission, cooldown_seconds, enabled_for_all_servers,
    delete_user_message, log_usage, is_active, require_confirmation,
    confirmation_message, cancel_message, webhook_url, webhook_failure_message,
    usage_count, created_at, updated_at
"#;

pub struct PostgresCommandRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresCommandRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Decodes a row, normalising the `options` column into the ordered list.
fn row_to_command(r: &PgRow) -> Result<Command, Error> {
    let kind: String = r.try_get("kind")?;
    let context_menu_type: Option<String> = r.try_get("context_menu_type")?;
    let permission: String = r.try_get("required_permission")?;
    let options: Value = r.try_get("options")?;
    let modal: Option<Value> = r.try_get("modal")?;

    Ok(Command {
        command_id: r.try_get("command_id")?,
        bot_id: r.try_get("bot_id")?,
        name: r.try_get("name")?,
        kind: text_to_enum(&kind)?,
        context_menu_type: context_menu_type.as_deref().map(text_to_enum).transpose()?,
        description: r.try_get("description")?,
        response: r.try_get("response")?,
        options: normalize_options(&options)?,
        modal: modal
            .filter(|m| !m.is_null())
            .map(serde_json::from_value::<ModalConfig>)
            .transpose()?,
        required_permission: text_to_enum(&permission)?,
        cooldown_seconds: r.try_get("cooldown_seconds")?,
        enabled_for_all_servers: r.try_get("enabled_for_all_servers")?,
        delete_user_message: r.try_get("delete_user_message")?,
        log_usage: r.try_get("log_usage")?,
        is_active: r.try_get("is_active")?,
        require_confirmation: r.try_get("require_confirmation")?,
        confirmation_message: r.try_get("confirmation_message")?,
        cancel_message: r.try_get("cancel_message")?,
        webhook_url: r.try_get("webhook_url")?,
        webhook_failure_message: r.try_get("webhook_failure_message")?,
        usage_count: r.try_get("usage_count")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl CommandRepository for PostgresCommandRepository {
    async fn create_command(&self, cmd: &Command) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO commands (
                command_id, bot_id, name, kind, context_menu_type, description, response,
                options, modal, required_permission, cooldown_seconds, enabled_for_all_servers,
                delete_user_message, log_usage, is_active, require_confirmation,
                confirmation_message, cancel_message, webhook_url, webhook_failure_message,
                usage_count, created_at, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,$21,$22,$23)
            "#,
        )
            .bind(cmd.command_id)
            .bind(&cmd.bot_id)
            .bind(&cmd.name)
            .bind(enum_to_text(&cmd.kind)?)
            .bind(cmd.context_menu_type.as_ref().map(enum_to_text).transpose()?)
            .bind(&cmd.description)
            .bind(&cmd.response)
            .bind(serde_json::to_value(&cmd.options)?)
            .bind(cmd.modal.as_ref().map(serde_json::to_value).transpose()?)
            .bind(enum_to_text(&cmd.required_permission)?)
            .bind(cmd.cooldown_seconds)
            .bind(cmd.enabled_for_all_servers)
            .bind(cmd.delete_user_message)
            .bind(cmd.log_usage)
            .bind(cmd.is_active)
            .bind(cmd.require_confirmation)
            .bind(&cmd.confirmation_message)
            .bind(&cmd.cancel_message)
            .bind(&cmd.webhook_url)
            .bind(&cmd.webhook_failure_message)
            .bind(cmd.usage_count)
            .bind(cmd.created_at)
            .bind(cmd.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_command_by_id(&self, command_id: Uuid) -> Result<Option<Command>, Error> {
        let sql = format!("SELECT {COMMAND_COLUMNS} FROM commands WHERE command_id = $1");
        let row_opt = sqlx::query(&sql)
            .bind(command_id)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(row_to_command).transpose()
    }

    async fn get_command_by_name(&self, bot_id: &str, name: &str) -> Result<Option<Command>, Error> {
        let sql = format!(
            "SELECT {COMMAND_COLUMNS} FROM commands WHERE bot_id = $1 AND LOWER(name) = LOWER($2)"
        );
        let row_opt = sqlx::query(&sql)
            .bind(bot_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(row_to_command).transpose()
    }

    async fn list_commands(&self, bot_id: &str) -> Result<Vec<Command>, Error> {
        let sql = format!("SELECT {COMMAND_COLUMNS} FROM commands WHERE bot_id = $1 ORDER BY name ASC");
        let rows = sqlx::query(&sql)
            .bind(bot_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_command).collect()
    }

    async fn update_command(&self, cmd: &Command) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE commands
            SET name = $2,
                kind = $3,
                context_menu_type = $4,
                description = $5,
                response = $6,
                options = $7,
                modal = $8,
                required_permission = $9,
                cooldown_seconds = $10,
                enabled_for_all_servers = $11,
                delete_user_message = $12,
                log_usage = $13,
                is_active = $14,
                require_confirmation = $15,
                confirmation_message = $16,
                cancel_message = $17,
                webhook_url = $18,
                webhook_failure_message = $19,
                updated_at = $20
            WHERE command_id = $1
            "#,
        )
            .bind(cmd.command_id)
            .bind(&cmd.name)
            .bind(enum_to_text(&cmd.kind)?)
            .bind(cmd.context_menu_type.as_ref().map(enum_to_text).transpose()?)
            .bind(&cmd.description)
            .bind(&cmd.response)
            .bind(serde_json::to_value(&cmd.options)?)
            .bind(cmd.modal.as_ref().map(serde_json::to_value).transpose()?)
            .bind(enum_to_text(&cmd.required_permission)?)
            .bind(cmd.cooldown_seconds)
            .bind(cmd.enabled_for_all_servers)
            .bind(cmd.delete_user_message)
            .bind(cmd.log_usage)
            .bind(cmd.is_active)
            .bind(cmd.require_confirmation)
            .bind(&cmd.confirmation_message)
            .bind(&cmd.cancel_message)
            .bind(&cmd.webhook_url)
            .bind(&cmd.webhook_failure_message)
            .bind(cmd.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_command(&self, command_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM commands WHERE command_id = $1")
            .bind(command_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_usage(&self, bot_id: &str, name: &str) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            UPDATE commands
            SET usage_count = usage_count + 1
            WHERE bot_id = $1 AND LOWER(name) = LOWER($2)
            "#,
        )
            .bind(bot_id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("command '{name}' for bot {bot_id}")));
        }
        Ok(())
    }
}
