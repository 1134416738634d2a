pub mod fakes;
pub mod fixtures;
pub mod helpers;

pub use fakes::{RecordedCall, RecordingInteractionClient, ScriptedHttpClient, StaticGuildDirectory};
pub use fixtures::{BOT_ID, CHANNEL_ID, EventBuilder, GUILD_ID, TestBot, command, message, user};
