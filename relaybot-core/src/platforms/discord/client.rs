// File: relaybot-core/src/platforms/discord/client.rs
//
// `InteractionClient` over twilight-http.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, trace};
use twilight_http::Client as HttpClient;
use twilight_http::api_error::ApiError;
use twilight_http::error::ErrorType;
use twilight_model::application::command::{
    Command as PlatformCommand, CommandOptionChoice, CommandOptionChoiceValue,
};
use twilight_model::channel::message::component::Component;
use twilight_model::channel::message::{Embed, MessageFlags};
use twilight_model::http::interaction::{
    InteractionResponse, InteractionResponseData, InteractionResponseType,
};
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, ChannelMarker, InteractionMarker, MessageMarker};
use twilight_util::builder::embed::EmbedBuilder;

use relaybot_common::models::{ModalConfig, TextInputStyle};

use crate::Error;
use crate::models::{AutocompleteChoice, ButtonSpec, ButtonTone, InteractionRef, OutgoingMessage};
use crate::platforms::InteractionClient;

/// Unknown interaction: the token expired before we answered.
const UNKNOWN_INTERACTION: u64 = 10062;
/// Interaction has already been acknowledged.
const ALREADY_ACKNOWLEDGED: u64 = 40060;

const BUTTON_STYLE_SUCCESS: u8 = 3;
const BUTTON_STYLE_DANGER: u8 = 4;

pub struct TwilightInteractionClient {
    http: Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
}

impl TwilightInteractionClient {
    pub fn new(http: Arc<HttpClient>, application_id: Id<ApplicationMarker>) -> Self {
        Self { http, application_id }
    }

    async fn respond(
        &self,
        interaction: &InteractionRef,
        response: InteractionResponse,
    ) -> Result<(), Error> {
        let id: Id<InteractionMarker> = parse_id(&interaction.id)?;
        self.http
            .interaction(self.application_id)
            .create_response(id, &interaction.token, &response)
            .await
            .map_err(|e| map_http_error("create_response", e))?;
        Ok(())
    }
}

fn parse_id<T>(raw: &str) -> Result<Id<T>, Error> {
    Id::<T>::from_str(raw).map_err(|e| Error::Parse(format!("invalid snowflake '{raw}': {e}")))
}

/// Discord answers late or duplicate acknowledgements with specific codes;
/// those become `Error::Interaction` so callers can stop retrying.
fn map_http_error(op: &str, err: twilight_http::Error) -> Error {
    if let ErrorType::Response { error: ApiError::General(general), .. } = err.kind() {
        if matches!(general.code, UNKNOWN_INTERACTION | ALREADY_ACKNOWLEDGED) {
            return Error::Interaction(format!("{op}: {} ({})", general.message, general.code));
        }
    }
    Error::Platform(format!("{op}: {err}"))
}

fn build_embed(message: &OutgoingMessage) -> Option<Embed> {
    message.embed.as_ref().map(|spec| {
        EmbedBuilder::new()
            .description(spec.description.clone())
            .color(spec.color)
            .build()
    })
}

fn button_json(button: &ButtonSpec) -> Value {
    let style = match button.tone {
        ButtonTone::Success => BUTTON_STYLE_SUCCESS,
        ButtonTone::Danger => BUTTON_STYLE_DANGER,
    };
    json!({
        "type": 2,
        "style": style,
        "label": button.label,
        "custom_id": button.custom_id,
        "disabled": button.disabled,
    })
}

/// Buttons share a single action row.
fn build_components(buttons: &[ButtonSpec]) -> Result<Vec<Component>, Error> {
    if buttons.is_empty() {
        return Ok(Vec::new());
    }
    let row = json!({
        "type": 1,
        "components": buttons.iter().map(button_json).collect::<Vec<_>>(),
    });
    Ok(vec![serde_json::from_value(row)?])
}

/// Each modal field is a text input wrapped in its own action row.
fn build_modal_components(modal: &ModalConfig) -> Result<Vec<Component>, Error> {
    modal
        .fields
        .iter()
        .map(|field| {
            let style = match field.style {
                TextInputStyle::Short => 1,
                TextInputStyle::Paragraph => 2,
            };
            let mut input = json!({
                "type": 4,
                "custom_id": field.custom_id,
                "label": field.label,
                "style": style,
                "required": field.required.unwrap_or(true),
            });
            if let Some(obj) = input.as_object_mut() {
                if let Some(p) = &field.placeholder {
                    obj.insert("placeholder".into(), json!(p));
                }
                if let Some(min) = field.min_length {
                    obj.insert("min_length".into(), json!(min));
                }
                if let Some(max) = field.max_length {
                    obj.insert("max_length".into(), json!(max));
                }
                if let Some(v) = &field.value {
                    obj.insert("value".into(), json!(v));
                }
            }
            let row = json!({ "type": 1, "components": [input] });
            serde_json::from_value(row).map_err(Error::from)
        })
        .collect()
}

fn response_data(message: &OutgoingMessage) -> Result<InteractionResponseData, Error> {
    Ok(InteractionResponseData {
        content: message.content.clone(),
        embeds: build_embed(message).map(|e| vec![e]),
        components: Some(build_components(&message.buttons)?),
        flags: message.ephemeral.then_some(MessageFlags::EPHEMERAL),
        ..Default::default()
    })
}

#[async_trait]
impl InteractionClient for TwilightInteractionClient {
    async fn defer(&self, interaction: &InteractionRef, ephemeral: bool) -> Result<(), Error> {
        trace!("defer interaction {} (ephemeral={ephemeral})", interaction.id);
        let response = InteractionResponse {
            kind: InteractionResponseType::DeferredChannelMessageWithSource,
            data: Some(InteractionResponseData {
                flags: ephemeral.then_some(MessageFlags::EPHEMERAL),
                ..Default::default()
            }),
        };
        self.respond(interaction, response).await
    }

    async fn reply(&self, interaction: &InteractionRef, message: OutgoingMessage) -> Result<(), Error> {
        let response = InteractionResponse {
            kind: InteractionResponseType::ChannelMessageWithSource,
            data: Some(response_data(&message)?),
        };
        self.respond(interaction, response).await
    }

    async fn edit_original(&self, interaction: &InteractionRef, message: OutgoingMessage) -> Result<(), Error> {
        let embeds: Vec<Embed> = build_embed(&message).into_iter().collect();
        let components = build_components(&message.buttons)?;
        let client = self.http.interaction(self.application_id);
        let mut request = client
            .update_response(&interaction.token)
            .components(Some(components.as_slice()));
        if let Some(content) = message.content.as_deref() {
            request = request.content(Some(content));
        }
        if !embeds.is_empty() {
            request = request.embeds(Some(embeds.as_slice()));
        }
        request
            .await
            .map_err(|e| map_http_error("update_response", e))?;
        Ok(())
    }

    async fn follow_up(&self, interaction: &InteractionRef, message: OutgoingMessage) -> Result<(), Error> {
        let embeds: Vec<Embed> = build_embed(&message).into_iter().collect();
        let components = build_components(&message.buttons)?;
        let client = self.http.interaction(self.application_id);
        let mut request = client
            .create_followup(&interaction.token)
            .embeds(&embeds)
            .components(&components);
        if let Some(content) = message.content.as_deref() {
            request = request.content(content);
        }
        if message.ephemeral {
            request = request.flags(MessageFlags::EPHEMERAL);
        }
        request
            .await
            .map_err(|e| map_http_error("create_followup", e))?;
        Ok(())
    }

    async fn update_component_message(
        &self,
        interaction: &InteractionRef,
        message: OutgoingMessage,
    ) -> Result<(), Error> {
        let response = InteractionResponse {
            kind: InteractionResponseType::UpdateMessage,
            data: Some(response_data(&message)?),
        };
        self.respond(interaction, response).await
    }

    async fn show_modal(&self, interaction: &InteractionRef, modal: &ModalConfig) -> Result<(), Error> {
        let response = InteractionResponse {
            kind: InteractionResponseType::Modal,
            data: Some(InteractionResponseData {
                custom_id: Some(modal.custom_id.clone()),
                title: Some(modal.title.clone()),
                components: Some(build_modal_components(modal)?),
                ..Default::default()
            }),
        };
        self.respond(interaction, response).await
    }

    async fn autocomplete(
        &self,
        interaction: &InteractionRef,
        choices: Vec<AutocompleteChoice>,
    ) -> Result<(), Error> {
        let choices = choices
            .into_iter()
            .map(|c| CommandOptionChoice {
                name: c.name,
                name_localizations: None,
                value: CommandOptionChoiceValue::String(c.value),
            })
            .collect();
        let response = InteractionResponse {
            kind: InteractionResponseType::ApplicationCommandAutocompleteResult,
            data: Some(InteractionResponseData {
                choices: Some(choices),
                ..Default::default()
            }),
        };
        self.respond(interaction, response).await
    }

    async fn set_global_commands(&self, commands: Vec<PlatformCommand>) -> Result<Vec<String>, Error> {
        debug!("Registering {} global commands", commands.len());
        let registered = self
            .http
            .interaction(self.application_id)
            .set_global_commands(&commands)
            .await
            .map_err(|e| map_http_error("set_global_commands", e))?
            .models()
            .await
            .map_err(|e| Error::Platform(format!("set_global_commands body: {e}")))?;
        Ok(registered.into_iter().map(|c| c.name).collect())
    }

    async fn send_channel_message(&self, channel_id: &str, message: OutgoingMessage) -> Result<(), Error> {
        let channel: Id<ChannelMarker> = parse_id(channel_id)?;
        let embeds: Vec<Embed> = build_embed(&message).into_iter().collect();
        let components = build_components(&message.buttons)?;
        let mut request = self
            .http
            .create_message(channel)
            .embeds(&embeds)
            .components(&components);
        if let Some(content) = message.content.as_deref() {
            request = request.content(content);
        }
        request
            .await
            .map_err(|e| map_http_error("create_message", e))?;
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), Error> {
        let channel: Id<ChannelMarker> = parse_id(channel_id)?;
        let message: Id<MessageMarker> = parse_id(message_id)?;
        self.http
            .delete_message(channel, message)
            .await
            .map_err(|e| map_http_error("delete_message", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaybot_common::models::ModalField;

    #[test]
    fn buttons_share_one_action_row() {
        let buttons = vec![
            ButtonSpec {
                custom_id: "relaybot:confirm:abc".into(),
                label: "Sim".into(),
                tone: ButtonTone::Success,
                disabled: false,
            },
            ButtonSpec {
                custom_id: "relaybot:cancel:abc".into(),
                label: "Não".into(),
                tone: ButtonTone::Danger,
                disabled: true,
            },
        ];
        let rows = build_components(&buttons).unwrap();
        assert_eq!(rows.len(), 1);
        match &rows[0] {
            Component::ActionRow(row) => assert_eq!(row.components.len(), 2),
            other => panic!("expected action row, got {other:?}"),
        }
        assert!(build_components(&[]).unwrap().is_empty());
    }

    #[test]
    fn modal_fields_become_text_input_rows() {
        let modal = ModalConfig {
            custom_id: "feedback".into(),
            title: "Feedback".into(),
            fields: vec![
                ModalField {
                    custom_id: "subject".into(),
                    label: "Subject".into(),
                    style: TextInputStyle::Short,
                    placeholder: Some("What about?".into()),
                    min_length: None,
                    max_length: Some(80),
                    required: None,
                    value: None,
                },
                ModalField {
                    custom_id: "body".into(),
                    label: "Body".into(),
                    style: TextInputStyle::Paragraph,
                    placeholder: None,
                    min_length: Some(10),
                    max_length: None,
                    required: Some(false),
                    value: None,
                },
            ],
        };
        let rows = build_modal_components(&modal).unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            let Component::ActionRow(row) = row else {
                panic!("expected action row");
            };
            assert!(matches!(row.components[0], Component::TextInput(_)));
        }
    }

    #[test]
    fn ephemeral_flag_only_when_requested() {
        let data = response_data(&OutgoingMessage::text("hi")).unwrap();
        assert_eq!(data.flags, None);
        let data = response_data(&OutgoingMessage::text("hi").ephemeral(true)).unwrap();
        assert_eq!(data.flags, Some(MessageFlags::EPHEMERAL));
    }
}
