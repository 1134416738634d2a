pub mod client;
pub mod convert;
pub mod directory;
pub mod runtime;

pub use client::TwilightInteractionClient;
pub use directory::CacheGuildDirectory;
pub use runtime::DiscordPlatform;
