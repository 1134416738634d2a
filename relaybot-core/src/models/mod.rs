// File: relaybot-core/src/models/mod.rs

pub mod interaction;
pub mod outgoing;

pub use relaybot_common::models::*;
pub use interaction::{
    AttachmentValue, ChannelContext, ContextTarget, FocusedOption, GuildContext, IncomingMessage,
    InteractionEvent, InteractionKind, InteractionRef, InvokingUser, MemberPermissions, OptionValue,
    ResolvedOption,
};
pub use outgoing::{AutocompleteChoice, ButtonSpec, ButtonTone, EMBED_COLOR, EmbedSpec, OutgoingMessage};
