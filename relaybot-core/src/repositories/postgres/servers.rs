// File: relaybot-core/src/repositories/postgres/servers.rs

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use relaybot_common::error::Error;
use relaybot_common::models::Server;
use relaybot_common::traits::repository_traits::ServerRepository;

pub struct PostgresServerRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresServerRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_server(r: &PgRow) -> Result<Server, Error> {
    Ok(Server {
        server_id: r.try_get("server_id")?,
        enabled: r.try_get("enabled")?,
        name: r.try_get("name")?,
        icon_url: r.try_get("icon_url")?,
        member_count: r.try_get("member_count")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl ServerRepository for PostgresServerRepository {
    async fn get_server_by_server_id(&self, server_id: &str) -> Result<Option<Server>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT server_id, enabled, name, icon_url, member_count, updated_at
            FROM servers
            WHERE server_id = $1
            "#,
        )
            .bind(server_id)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(row_to_server).transpose()
    }

    async fn upsert_server(&self, server: &Server) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO servers (server_id, enabled, name, icon_url, member_count, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (server_id) DO UPDATE
            SET enabled = EXCLUDED.enabled,
                name = COALESCE(EXCLUDED.name, servers.name),
                icon_url = COALESCE(EXCLUDED.icon_url, servers.icon_url),
                member_count = COALESCE(EXCLUDED.member_count, servers.member_count),
                updated_at = EXCLUDED.updated_at
            "#,
        )
            .bind(&server.server_id)
            .bind(server.enabled)
            .bind(&server.name)
            .bind(&server.icon_url)
            .bind(server.member_count)
            .bind(server.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_servers(&self) -> Result<Vec<Server>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT server_id, enabled, name, icon_url, member_count, updated_at
            FROM servers
            ORDER BY server_id
            "#,
        )
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_server).collect()
    }
}
