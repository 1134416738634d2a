// File: src/services/discord/handlers/modal.rs

use async_trait::async_trait;
use tracing::debug;

use crate::Error;
use crate::models::{Command, CommandKind, InteractionEvent, InteractionKind, OptionValue, OutgoingMessage};
use crate::services::discord::executor::{CommandExecutor, Invocation};
use crate::services::discord::handlers::{COMMAND_UNAVAILABLE_MESSAGE, InteractionHandler};
use crate::services::discord::template::TemplateParam;

pub struct ModalSubmitHandler {
    executor: CommandExecutor,
}

impl ModalSubmitHandler {
    pub fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }

    async fn find_command(&self, modal_id: &str) -> Result<Option<Command>, Error> {
        let session = self.executor.session();
        let commands = session.commands.list_commands(&session.bot_id).await?;
        Ok(commands.into_iter().find(|c| {
            c.is_active
                && c.kind == CommandKind::Modal
                && c.modal.as_ref().is_some_and(|m| m.custom_id == modal_id)
        }))
    }
}

/// Values in declared field order, read by each field's custom id. Fields
/// the user left blank bind as empty text.
pub fn collect_fields(command: &Command, submitted: &[(String, String)]) -> Vec<TemplateParam> {
    let Some(modal) = &command.modal else {
        return Vec::new();
    };
    modal
        .fields
        .iter()
        .map(|field| {
            let value = submitted
                .iter()
                .find(|(id, _)| *id == field.custom_id)
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            TemplateParam::new(&field.custom_id, OptionValue::String(value))
        })
        .collect()
}

#[async_trait]
impl InteractionHandler for ModalSubmitHandler {
    fn id(&self) -> &str {
        "discord.modal_submit"
    }

    async fn handle(&self, event: &InteractionEvent) -> Result<(), Error> {
        let InteractionKind::ModalSubmit { custom_id, fields } = &event.kind else {
            return Ok(());
        };

        let Some(command) = self.find_command(custom_id).await? else {
            debug!("no active modal command with custom id '{custom_id}'");
            let notice = OutgoingMessage::text(COMMAND_UNAVAILABLE_MESSAGE).ephemeral(true);
            self.executor.session().client.reply(&event.interaction, notice).await?;
            return Ok(());
        };

        let params = collect_fields(&command, fields);
        self.executor.run(Invocation::new(event, &command, params), true).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModalConfig, ModalField, TextInputStyle};

    fn field(id: &str) -> ModalField {
        ModalField {
            custom_id: id.into(),
            label: id.into(),
            style: TextInputStyle::Short,
            placeholder: None,
            min_length: None,
            max_length: None,
            required: None,
            value: None,
        }
    }

    #[test]
    fn fields_follow_declared_order() {
        let mut cmd = Command::new("bot", "report", CommandKind::Modal);
        cmd.modal = Some(ModalConfig {
            custom_id: "report_form".into(),
            title: "Report".into(),
            fields: vec![field("Subject"), field("details")],
        });
        let submitted = vec![
            ("details".to_string(), "it broke".to_string()),
            ("Subject".to_string(), "bug".to_string()),
            ("extra".to_string(), "ignored".to_string()),
        ];
        let params = collect_fields(&cmd, &submitted);
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].key, "subject");
        assert_eq!(params[0].value, OptionValue::String("bug".into()));
        assert_eq!(params[1].key, "details");
    }

    #[test]
    fn mixed_case_field_ids_fill_their_placeholders() {
        use crate::services::discord::template::{TemplateContext, TemplateMode, render};

        let mut cmd = Command::new("bot", "report", CommandKind::Modal);
        cmd.modal = Some(ModalConfig {
            custom_id: "report_form".into(),
            title: "Report".into(),
            fields: vec![field("Subject")],
        });
        let params = collect_fields(&cmd, &[("Subject".to_string(), "bug".to_string())]);
        let ctx = TemplateContext {
            mode: TemplateMode::Response { ping: None },
            params: &params,
            user: "alice",
            server: "Rustaceans",
            extras: &[],
        };
        assert_eq!(render("New report: {Subject}", &ctx), "New report: bug");
    }
}
