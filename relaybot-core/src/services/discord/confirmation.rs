// File: src/services/discord/confirmation.rs
//
// Per-invocation confirm/cancel round-trip.
//
//   Idle -> AwaitingConfirmation -> { Confirmed | Cancelled | TimedOut }
//
// The buttons carry `relaybot:{confirm|cancel}:{nonce}` custom ids. Presses
// arrive as separate interactions; the dispatcher hands them to the
// `ComponentRouter`, which forwards them to the waiting invocation.

use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::Error;
use crate::models::{ButtonSpec, ButtonTone, InteractionRef, OutgoingMessage};
use crate::platforms::InteractionClient;

const CUSTOM_ID_PREFIX: &str = "relaybot";
pub const CONFIRM_LABEL: &str = "Sim";
pub const CANCEL_LABEL: &str = "Não";
pub const NOT_YOUR_CONFIRMATION: &str = "Only the person who ran this command can answer it.";
pub const CONFIRMATION_EXPIRED: &str = "This confirmation is no longer active.";
pub const DEFAULT_CONFIRMATION_MESSAGE: &str = "Are you sure you want to run this command?";
pub const DEFAULT_CANCEL_MESSAGE: &str = "Command cancelled.";
pub const TIMEOUT_MESSAGE: &str = "Confirmation timed out. The command was not run.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirm,
    Cancel,
}

impl Decision {
    fn as_str(self) -> &'static str {
        match self {
            Decision::Confirm => "confirm",
            Decision::Cancel => "cancel",
        }
    }
}

pub fn custom_id(decision: Decision, nonce: &str) -> String {
    format!("{CUSTOM_ID_PREFIX}:{}:{nonce}", decision.as_str())
}

/// Splits a confirmation custom id into its decision and nonce.
pub fn parse_custom_id(custom_id: &str) -> Option<(Decision, &str)> {
    let mut parts = custom_id.splitn(3, ':');
    if parts.next()? != CUSTOM_ID_PREFIX {
        return None;
    }
    let decision = match parts.next()? {
        "confirm" => Decision::Confirm,
        "cancel" => Decision::Cancel,
        _ => return None,
    };
    let nonce = parts.next().filter(|n| !n.is_empty())?;
    Some((decision, nonce))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationState {
    Idle,
    AwaitingConfirmation,
    Confirmed,
    Cancelled,
    TimedOut,
}

impl ConfirmationState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConfirmationState::Confirmed | ConfirmationState::Cancelled | ConfirmationState::TimedOut
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressVerdict {
    /// The press moved the flow into this terminal state.
    Accepted(ConfirmationState),
    /// Someone other than the invoker pressed; state unchanged.
    ForeignUser,
    /// The flow is not awaiting a decision.
    Ignored,
}

/// State of one confirmation round-trip.
#[derive(Debug, Clone)]
pub struct ConfirmationFlow {
    nonce: String,
    invoker_id: String,
    state: ConfirmationState,
}

impl ConfirmationFlow {
    pub fn new(nonce: &str, invoker_id: &str) -> Self {
        Self {
            nonce: nonce.to_string(),
            invoker_id: invoker_id.to_string(),
            state: ConfirmationState::Idle,
        }
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn state(&self) -> ConfirmationState {
        self.state
    }

    pub fn begin(&mut self) -> Result<(), Error> {
        if self.state != ConfirmationState::Idle {
            return Err(Error::Platform(format!(
                "confirmation {} already started ({:?})",
                self.nonce, self.state
            )));
        }
        self.state = ConfirmationState::AwaitingConfirmation;
        Ok(())
    }

    pub fn on_press(&mut self, user_id: &str, decision: Decision) -> PressVerdict {
        if self.state != ConfirmationState::AwaitingConfirmation {
            return PressVerdict::Ignored;
        }
        if user_id != self.invoker_id {
            return PressVerdict::ForeignUser;
        }
        self.state = match decision {
            Decision::Confirm => ConfirmationState::Confirmed,
            Decision::Cancel => ConfirmationState::Cancelled,
        };
        PressVerdict::Accepted(self.state)
    }

    /// Returns false when the flow already ended.
    pub fn on_timeout(&mut self) -> bool {
        if self.state != ConfirmationState::AwaitingConfirmation {
            return false;
        }
        self.state = ConfirmationState::TimedOut;
        true
    }

    pub fn buttons(&self, disabled: bool) -> Vec<ButtonSpec> {
        vec![
            ButtonSpec {
                custom_id: custom_id(Decision::Confirm, &self.nonce),
                label: CONFIRM_LABEL.to_string(),
                tone: ButtonTone::Success,
                disabled,
            },
            ButtonSpec {
                custom_id: custom_id(Decision::Cancel, &self.nonce),
                label: CANCEL_LABEL.to_string(),
                tone: ButtonTone::Danger,
                disabled,
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentPress {
    pub interaction: InteractionRef,
    pub user_id: String,
    pub decision: Decision,
}

/// Tagged result of waiting on a confirmation. The press interaction is
/// carried so the caller can acknowledge it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed(InteractionRef),
    Cancelled(InteractionRef),
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteResult {
    /// Not a confirmation button.
    NotConfirmation,
    /// A confirmation button whose invocation is no longer waiting.
    Expired,
    Delivered,
}

/// Routes button presses to the invocation waiting on them.
#[derive(Default)]
pub struct ComponentRouter {
    pending: DashMap<String, UnboundedSender<ComponentPress>>,
}

impl ComponentRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called before the buttons are shown so no press is missed.
    pub fn register(&self, nonce: &str) -> PendingConfirmation {
        let (tx, rx) = unbounded_channel();
        self.pending.insert(nonce.to_string(), tx);
        PendingConfirmation { rx }
    }

    pub fn unregister(&self, nonce: &str) {
        self.pending.remove(nonce);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn route(&self, custom_id: &str, interaction: InteractionRef, user_id: &str) -> RouteResult {
        let Some((decision, nonce)) = parse_custom_id(custom_id) else {
            return RouteResult::NotConfirmation;
        };
        let Some(tx) = self.pending.get(nonce) else {
            return RouteResult::Expired;
        };
        let press = ComponentPress {
            interaction,
            user_id: user_id.to_string(),
            decision,
        };
        match tx.send(press) {
            Ok(()) => RouteResult::Delivered,
            Err(_) => RouteResult::Expired,
        }
    }
}

pub struct PendingConfirmation {
    rx: UnboundedReceiver<ComponentPress>,
}

impl PendingConfirmation {
    /// Waits for the invoker's decision or the timeout, whichever comes first.
    /// Presses by other users get an ephemeral rejection and do not end the wait.
    pub async fn wait(
        mut self,
        flow: &mut ConfirmationFlow,
        client: &dyn InteractionClient,
        timeout: Duration,
    ) -> ConfirmationOutcome {
        let deadline = Instant::now() + timeout;
        loop {
            let press = match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(press)) => press,
                Ok(None) | Err(_) => {
                    flow.on_timeout();
                    return ConfirmationOutcome::TimedOut;
                }
            };

            match flow.on_press(&press.user_id, press.decision) {
                PressVerdict::Accepted(ConfirmationState::Confirmed) => {
                    return ConfirmationOutcome::Confirmed(press.interaction);
                }
                PressVerdict::Accepted(_) => {
                    return ConfirmationOutcome::Cancelled(press.interaction);
                }
                PressVerdict::ForeignUser => {
                    trace!("confirmation {}: press by foreign user {}", flow.nonce(), press.user_id);
                    let notice = OutgoingMessage::text(NOT_YOUR_CONFIRMATION).ephemeral(true);
                    if let Err(e) = client.reply(&press.interaction, notice).await {
                        debug!("could not reject foreign confirmation press: {e}");
                    }
                }
                PressVerdict::Ignored => {}
            }
        }
    }
}
