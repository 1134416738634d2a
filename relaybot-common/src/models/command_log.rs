use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Terminal status of a dispatched command. Serialized with the labels the
/// log viewer has always shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogStatus {
    #[serde(rename = "Sucesso")]
    Success,
    #[serde(rename = "Erro")]
    Error,
    #[serde(rename = "Permissão Negada")]
    PermissionDenied,
}

impl LogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LogStatus::Success => "Sucesso",
            LogStatus::Error => "Erro",
            LogStatus::PermissionDenied => "Permissão Negada",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Sucesso" => Some(LogStatus::Success),
            "Erro" => Some(LogStatus::Error),
            "Permissão Negada" => Some(LogStatus::PermissionDenied),
            _ => None,
        }
    }
}

/// Outcome of the outbound webhook call attached to a log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackOutcome {
    /// Either `Success` or `Error`.
    pub status: LogStatus,
    pub http_status: Option<u16>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl CallbackOutcome {
    pub fn success(http_status: u16) -> Self {
        Self {
            status: LogStatus::Success,
            http_status: Some(http_status),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(http_status: Option<u16>, error: impl Into<String>) -> Self {
        Self {
            status: LogStatus::Error,
            http_status,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == LogStatus::Success
    }
}

/// Immutable audit record, one per terminal interaction outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandLog {
    pub log_id: Uuid,
    pub bot_id: String,
    pub server_id: Option<String>,
    pub server_name: Option<String>,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub command_name: String,
    pub status: LogStatus,
    pub timestamp: DateTime<Utc>,
    pub parameters: Map<String, Value>,
    pub error_message: Option<String>,
    pub callback: Option<CallbackOutcome>,
}
