// File: src/services/discord/executor.rs
//
// Shared tail of every interaction-invoked command:
//   permission gate -> optional confirmation -> defer -> render -> reply
//   -> usage increment -> webhook -> audit log
// with one top-level error policy. Nothing here returns an error to the
// dispatcher.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::Error;
use crate::context::BotSession;
use crate::models::{Command, CommandKind, ContextTarget, InteractionEvent, OutgoingMessage};
use crate::services::audit_log::{AuditLogger, LogSubject};
use crate::services::discord::confirmation::{
    ConfirmationFlow, ConfirmationOutcome, DEFAULT_CANCEL_MESSAGE, DEFAULT_CONFIRMATION_MESSAGE,
    TIMEOUT_MESSAGE,
};
use crate::services::discord::permissions::{PERMISSION_DENIED_MESSAGE, is_allowed};
use crate::services::discord::template::{
    TemplateContext, TemplateMode, TemplateParam, params_to_json, render,
};
use crate::services::webhook::{WebhookNotifier, WebhookPayload};

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong while running this command.";
/// Zero-width space; the platform rejects empty message content.
pub const EMPTY_RESPONSE: &str = "\u{200b}";

/// One resolved command invocation ready to run.
pub struct Invocation<'a> {
    pub event: &'a InteractionEvent,
    pub command: &'a Command,
    pub params: Vec<TemplateParam>,
    /// Context-menu target; replaces parameters in the webhook payload and
    /// provides `{target}`.
    pub target: Option<ContextTarget>,
}

impl<'a> Invocation<'a> {
    pub fn new(event: &'a InteractionEvent, command: &'a Command, params: Vec<TemplateParam>) -> Self {
        Self {
            event,
            command,
            params,
            target: None,
        }
    }

    pub fn with_target(mut self, target: ContextTarget) -> Self {
        self.target = Some(target);
        self
    }

    fn extras(&self) -> Vec<(&'static str, String)> {
        self.target
            .iter()
            .map(|t| ("target", t.display_name().to_string()))
            .collect()
    }

    fn ephemeral(&self) -> bool {
        !self.command.delete_user_message
    }
}

/// How far the original interaction has been answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ack {
    None,
    Deferred,
    Replied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    /// Defer the original interaction, then edit the deferred reply.
    Deferred,
    /// The original interaction was already answered by the confirmation prompt.
    FollowUp,
}

#[derive(Clone)]
pub struct CommandExecutor {
    session: Arc<BotSession>,
    notifier: WebhookNotifier,
    audit: AuditLogger,
}

impl CommandExecutor {
    pub fn new(session: Arc<BotSession>) -> Self {
        let notifier = WebhookNotifier::new(session.http.clone(), session.settings.webhook_timeout);
        let audit = AuditLogger::new(session.logs.clone(), &session.bot_id);
        Self {
            session,
            notifier,
            audit,
        }
    }

    pub fn session(&self) -> &Arc<BotSession> {
        &self.session
    }

    pub fn notifier(&self) -> &WebhookNotifier {
        &self.notifier
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Permission gate for an invocation. On denial the user is told and a
    /// `Permissão Negada` entry is written; returns whether to proceed.
    pub async fn authorize(&self, event: &InteractionEvent, command: &Command, params: &[TemplateParam]) -> bool {
        if is_allowed(command.required_permission, event.permissions, event.is_guild_owner()) {
            return true;
        }

        info!(
            "user {} denied /{} (requires {:?})",
            event.user.id, command.name, command.required_permission
        );
        let notice = OutgoingMessage::text(PERMISSION_DENIED_MESSAGE).ephemeral(true);
        if let Err(e) = self.session.client.reply(&event.interaction, notice).await {
            debug!("could not deliver permission denial: {e}");
        }
        self.audit
            .permission_denied(&LogSubject::from(event), &command.name, params_to_json(params))
            .await;
        false
    }

    /// Runs an invocation to a terminal outcome. The permission gate is
    /// applied only when `check_permission` is set.
    pub async fn run(&self, inv: Invocation<'_>, check_permission: bool) {
        if check_permission && !self.authorize(inv.event, inv.command, &inv.params).await {
            return;
        }

        let mut ack = Ack::None;
        let result = if inv.command.require_confirmation {
            match self.confirm(&inv, &mut ack).await {
                Ok(true) => self.execute(&inv, &mut ack, Delivery::FollowUp).await,
                Ok(false) => Ok(()),
                Err(e) => Err(e),
            }
        } else {
            self.execute(&inv, &mut ack, Delivery::Deferred).await
        };

        if let Err(e) = result {
            self.fail(&inv, ack, e).await;
        }
    }

    /// Shows the confirmation prompt and waits for the outcome. Returns
    /// whether the command body should run.
    async fn confirm(&self, inv: &Invocation<'_>, ack: &mut Ack) -> Result<bool, Error> {
        let client = self.session.client.as_ref();
        let nonce = Uuid::new_v4().simple().to_string();
        let mut flow = ConfirmationFlow::new(&nonce, &inv.event.user.id);
        let pending = self.session.components.register(&nonce);
        flow.begin()?;

        let template = inv
            .command
            .confirmation_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_CONFIRMATION_MESSAGE);
        let extras = inv.extras();
        let prompt = render(
            template,
            &TemplateContext {
                mode: TemplateMode::Confirmation,
                params: &inv.params,
                user: &inv.event.user.username,
                server: inv.event.server_name(),
                extras: &extras,
            },
        );

        let message = OutgoingMessage::text(prompt)
            .ephemeral(inv.ephemeral())
            .with_buttons(flow.buttons(false));
        if let Err(e) = client.reply(&inv.event.interaction, message).await {
            self.session.components.unregister(&nonce);
            return Err(e);
        }
        *ack = Ack::Replied;

        let outcome = pending
            .wait(&mut flow, client, self.session.settings.confirmation_timeout)
            .await;
        self.session.components.unregister(&nonce);

        match outcome {
            ConfirmationOutcome::Confirmed(press) => {
                debug!("/{} confirmed by {}", inv.command.name, inv.event.user.id);
                let disabled = OutgoingMessage::default().with_buttons(flow.buttons(true));
                client.update_component_message(&press, disabled).await?;
                Ok(true)
            }
            ConfirmationOutcome::Cancelled(press) => {
                info!("/{} cancelled by {}", inv.command.name, inv.event.user.id);
                let text = inv
                    .command
                    .cancel_message
                    .as_deref()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(DEFAULT_CANCEL_MESSAGE);
                let cancelled = OutgoingMessage::text(text).with_buttons(flow.buttons(true));
                client.update_component_message(&press, cancelled).await?;
                Ok(false)
            }
            ConfirmationOutcome::TimedOut => {
                info!("/{} confirmation timed out for {}", inv.command.name, inv.event.user.id);
                let expired = OutgoingMessage::text(TIMEOUT_MESSAGE).with_buttons(flow.buttons(true));
                client.edit_original(&inv.event.interaction, expired).await?;
                Ok(false)
            }
        }
    }

    async fn execute(&self, inv: &Invocation<'_>, ack: &mut Ack, delivery: Delivery) -> Result<(), Error> {
        let session = &self.session;
        let client = session.client.as_ref();
        let command = inv.command;
        let interaction = &inv.event.interaction;

        if delivery == Delivery::Deferred && *ack == Ack::None {
            client.defer(interaction, inv.ephemeral()).await?;
            *ack = Ack::Deferred;
        }

        let extras = inv.extras();
        let body = render(
            &command.response,
            &TemplateContext {
                mode: TemplateMode::Response {
                    ping: session.latency_ms(),
                },
                params: &inv.params,
                user: &inv.event.user.username,
                server: inv.event.server_name(),
                extras: &extras,
            },
        );
        let message = response_message(command.kind, body).ephemeral(inv.ephemeral());

        match delivery {
            Delivery::Deferred => client.edit_original(interaction, message).await?,
            Delivery::FollowUp => client.follow_up(interaction, message).await?,
        }

        session.commands.increment_usage(&session.bot_id, &command.name).await?;

        let callback = match command.webhook_target() {
            Some(url) => {
                let payload = WebhookPayload::new(
                    &command.name,
                    &session.bot_id,
                    &inv.event.user,
                    inv.event.guild.as_ref(),
                    inv.event.channel.as_ref(),
                );
                let payload = match &inv.target {
                    Some(target) => payload.with_target(target),
                    None => payload
                        .with_interaction(interaction)
                        .with_parameters(params_to_json(&inv.params)),
                };
                let outcome = self.notifier.notify(url, &payload).await;
                if !outcome.is_success() {
                    if let Some(text) = command.webhook_failure_message.as_deref().filter(|t| !t.is_empty()) {
                        let notice = OutgoingMessage::text(text).ephemeral(true);
                        if let Err(e) = client.follow_up(interaction, notice).await {
                            debug!("could not deliver webhook failure notice: {e}");
                        }
                    }
                }
                Some(outcome)
            }
            None => None,
        };

        if command.log_usage {
            self.audit
                .success(
                    &LogSubject::from(inv.event),
                    &command.name,
                    params_to_json(&inv.params),
                    callback,
                )
                .await;
        }

        info!("/{} executed for {} in {}", command.name, inv.event.user.id, inv.event.server_name());
        Ok(())
    }

    async fn fail(&self, inv: &Invocation<'_>, ack: Ack, err: Error) {
        if let Error::Interaction(reason) = &err {
            debug!("interaction for /{} went stale: {reason}", inv.command.name);
            return;
        }

        warn!("/{} failed for {}: {err}", inv.command.name, inv.event.user.id);
        let client = self.session.client.as_ref();
        let interaction = &inv.event.interaction;
        let notice = OutgoingMessage::text(GENERIC_FAILURE_MESSAGE).ephemeral(true);
        let sent = match ack {
            Ack::None => client.reply(interaction, notice).await,
            Ack::Deferred => client.edit_original(interaction, notice).await,
            Ack::Replied => client.follow_up(interaction, notice).await,
        };
        if let Err(e) = sent {
            debug!("could not deliver failure notice: {e}");
        }

        self.audit
            .failure(
                &LogSubject::from(inv.event),
                &inv.command.name,
                params_to_json(&inv.params),
                err.to_string(),
            )
            .await;
    }
}

/// Wraps a rendered body the way the command kind is delivered.
pub fn response_message(kind: CommandKind, body: String) -> OutgoingMessage {
    let body = if body.trim().is_empty() {
        EMPTY_RESPONSE.to_string()
    } else {
        body
    };
    match kind {
        CommandKind::Embed => OutgoingMessage::embed(body),
        _ => OutgoingMessage::text(body),
    }
}
