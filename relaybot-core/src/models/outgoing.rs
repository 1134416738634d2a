// File: relaybot-core/src/models/outgoing.rs

/// Embed color used for `embed`-kind command responses.
pub const EMBED_COLOR: u32 = 0x5865F2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonTone {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSpec {
    pub custom_id: String,
    pub label: String,
    pub tone: ButtonTone,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedSpec {
    pub description: String,
    pub color: u32,
}

/// A message the engine wants delivered. On edits, `buttons` replaces the
/// existing components (empty clears them).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embed: Option<EmbedSpec>,
    pub ephemeral: bool,
    pub buttons: Vec<ButtonSpec>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn embed(description: impl Into<String>) -> Self {
        Self {
            embed: Some(EmbedSpec {
                description: description.into(),
                color: EMBED_COLOR,
            }),
            ..Default::default()
        }
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<ButtonSpec>) -> Self {
        self.buttons = buttons;
        self
    }

    /// Text of the message, whether sent as content or embed.
    pub fn body(&self) -> Option<&str> {
        self.content
            .as_deref()
            .or_else(|| self.embed.as_ref().map(|e| e.description.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutocompleteChoice {
    pub name: String,
    pub value: String,
}

impl AutocompleteChoice {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
