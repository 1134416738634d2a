use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-guild enablement record. The engine only reads `enabled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub server_id: String,
    pub enabled: bool,
    pub name: Option<String>,
    pub icon_url: Option<String>,
    pub member_count: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl Server {
    pub fn new(server_id: &str, enabled: bool) -> Self {
        Self {
            server_id: server_id.to_string(),
            enabled,
            name: None,
            icon_url: None,
            member_count: None,
            updated_at: Utc::now(),
        }
    }
}
