// File: src/services/webhook.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::http::{HttpClient, HttpRequest};
use crate::models::{
    CallbackOutcome, ChannelContext, ContextTarget, GuildContext, InteractionRef, InvokingUser,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookUser {
    pub id: String,
    pub username: String,
    pub discriminator: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookPlace {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookInteraction {
    pub id: String,
    pub token: String,
    pub follow_up_webhook_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookTarget {
    pub id: String,
    pub name: String,
}

/// Body POSTed to a command's webhook URL.
///
/// Slash and modal invocations carry `interaction` + `parameters`; context-menu
/// invocations carry `target` + `targetId`/`targetName` instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub command: String,
    pub user: WebhookUser,
    pub server: WebhookPlace,
    pub channel: WebhookPlace,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction: Option<WebhookInteraction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<WebhookTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub bot_id: String,
}

impl WebhookPayload {
    pub fn new(
        command: &str,
        bot_id: &str,
        user: &InvokingUser,
        guild: Option<&GuildContext>,
        channel: Option<&ChannelContext>,
    ) -> Self {
        Self {
            command: command.to_string(),
            user: WebhookUser {
                id: user.id.clone(),
                username: user.username.clone(),
                discriminator: user.discriminator.clone(),
                avatar_url: user.avatar_url.clone(),
            },
            server: WebhookPlace {
                id: guild.map(|g| g.id.clone()),
                name: guild.map(|g| g.name.clone()),
            },
            channel: WebhookPlace {
                id: channel.map(|c| c.id.clone()),
                name: channel.and_then(|c| c.name.clone()),
            },
            interaction: None,
            target: None,
            parameters: None,
            target_id: None,
            target_name: None,
            timestamp: Utc::now(),
            bot_id: bot_id.to_string(),
        }
    }

    pub fn with_interaction(mut self, interaction: &InteractionRef) -> Self {
        self.interaction = Some(WebhookInteraction {
            id: interaction.id.clone(),
            token: interaction.token.clone(),
            follow_up_webhook_url: interaction.follow_up_url(),
        });
        self
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn with_target(mut self, target: &ContextTarget) -> Self {
        let name = target.display_name().to_string();
        self.target = Some(WebhookTarget {
            id: target.id().to_string(),
            name: name.clone(),
        });
        self.target_id = Some(target.id().to_string());
        self.target_name = Some(name);
        self
    }
}

/// Fires command webhooks and classifies the outcome. Never returns an error:
/// every failure becomes an `Erro` callback outcome.
#[derive(Clone)]
pub struct WebhookNotifier {
    http: Arc<dyn HttpClient>,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(http: Arc<dyn HttpClient>, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    pub async fn notify(&self, url: &str, payload: &WebhookPayload) -> CallbackOutcome {
        let body = match serde_json::to_value(payload) {
            Ok(body) => body,
            Err(e) => return CallbackOutcome::failure(None, e.to_string()),
        };
        let request = HttpRequest::post_json(url, body, self.timeout);

        let outcome = match tokio::time::timeout(self.timeout, self.http.send(request)).await {
            Ok(Ok(resp)) if resp.is_success() => CallbackOutcome::success(resp.status),
            Ok(Ok(resp)) => CallbackOutcome::failure(Some(resp.status), format!("HTTP {}", resp.status)),
            Ok(Err(e)) => CallbackOutcome::failure(None, e.to_string()),
            Err(_) => CallbackOutcome::failure(
                None,
                format!("webhook timed out after {}ms", self.timeout.as_millis()),
            ),
        };

        if outcome.is_success() {
            debug!("webhook for /{} delivered to {url}", payload.command);
        } else {
            warn!(
                "webhook for /{} to {url} failed: {}",
                payload.command,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
        outcome
    }
}
